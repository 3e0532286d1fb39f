use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// `None` waits for the remote side indefinitely.
    pub request_timeout: Option<Duration>,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

impl ChannelConfig {
    pub fn from_env() -> Self {
        Self {
            request_timeout: env::var("ELECTRON_MOCK_REQUEST_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|ms: &u64| *ms > 0)
                .map(Duration::from_millis),
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_has_no_timeout() {
        if env::var("ELECTRON_MOCK_REQUEST_TIMEOUT_MS").is_err() {
            assert_eq!(ChannelConfig::default().request_timeout, None);
        }
    }

    #[test]
    fn test_builder_sets_timeout() {
        let config = ChannelConfig::default().with_request_timeout(Duration::from_millis(250));
        assert_eq!(config.request_timeout, Some(Duration::from_millis(250)));
    }
}
