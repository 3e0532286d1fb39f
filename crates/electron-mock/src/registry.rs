use std::collections::BTreeMap;
use std::collections::HashMap;
use std::sync::Arc;

use electron_mock_common::FunctionTable;
use electron_mock_ipc::MockTarget;
use electron_mock_ipc::RemoteChannel;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::MockError;
use crate::mock::MockHandle;

/// Session-wide map from (namespace, method) to its mock handle.
///
/// Installs are serialized per pair: a gate for the pair is held across the
/// install round trip, so two callers asking for the same pair never install
/// two remote mocks, while other pairs and the readers below are not held up.
#[derive(Default)]
pub struct MockRegistry {
    session: u64,
    mocks: Mutex<BTreeMap<MockTarget, Arc<MockHandle>>>,
    gates: Mutex<HashMap<MockTarget, Arc<Mutex<()>>>>,
}

impl MockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn for_session(session: u64) -> Self {
        Self {
            session,
            ..Self::default()
        }
    }

    /// Returns the active handle for `target`, installing one if there is
    /// none or the previous one was restored.
    pub async fn get_or_create(
        &self,
        target: MockTarget,
        channel: &Arc<dyn RemoteChannel>,
        local_functions: &FunctionTable,
    ) -> Result<Arc<MockHandle>, MockError> {
        let gate = Arc::clone(self.gates.lock().await.entry(target.clone()).or_default());
        let _installing = gate.lock().await;

        let existing = self.mocks.lock().await.get(&target).cloned();
        if let Some(existing) = existing {
            if !existing.is_restored().await {
                debug!(mock = %existing.name(), "reusing existing mock");
                return Ok(existing);
            }
        }

        let handle = Arc::new(
            MockHandle::install(
                self.session,
                target.clone(),
                channel,
                local_functions.clone(),
            )
            .await?,
        );
        self.mocks.lock().await.insert(target, Arc::clone(&handle));
        Ok(handle)
    }

    pub async fn get(&self, namespace: &str, method: &str) -> Option<Arc<MockHandle>> {
        self.mocks
            .lock()
            .await
            .get(&MockTarget::new(namespace, method))
            .cloned()
    }

    pub async fn handles(&self) -> Vec<Arc<MockHandle>> {
        self.mocks.lock().await.values().cloned().collect()
    }

    pub async fn handles_in(&self, namespace: &str) -> Vec<Arc<MockHandle>> {
        self.mocks
            .lock()
            .await
            .values()
            .filter(|handle| handle.namespace() == namespace)
            .cloned()
            .collect()
    }

    /// Drops restored handles from the map.
    pub async fn prune_restored(&self) -> usize {
        let mut restored = Vec::new();
        for handle in self.handles().await {
            if handle.is_restored().await {
                restored.push(handle);
            }
        }

        let mut mocks = self.mocks.lock().await;
        let mut pruned = 0;
        for handle in restored {
            // A fresh handle may have replaced the restored one meanwhile.
            if mocks
                .get(handle.target())
                .is_some_and(|current| Arc::ptr_eq(current, &handle))
            {
                mocks.remove(handle.target());
                pruned += 1;
            }
        }
        pruned
    }

    pub async fn len(&self) -> usize {
        self.mocks.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.mocks.lock().await.is_empty()
    }
}
