use std::env;

const DEFAULT_CUSTOM_API_COMMAND: &str = "api";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceOptions {
    /// Name under which the application's custom bridge API is exposed.
    pub custom_api_command: String,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self::from_env()
    }
}

impl ServiceOptions {
    pub fn from_env() -> Self {
        Self {
            custom_api_command: env::var("ELECTRON_MOCK_CUSTOM_API")
                .ok()
                .unwrap_or_else(|| DEFAULT_CUSTOM_API_COMMAND.to_string()),
        }
    }

    pub fn with_custom_api_command(mut self, name: impl Into<String>) -> Self {
        self.custom_api_command = name.into();
        self
    }
}
