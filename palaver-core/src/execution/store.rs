//! Storage backends for execution history.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::Result;
use crate::execution::ExecutionRecord;
use crate::types::{ActionId, PlayerId, WorldId};

/// Durable key-value storage for [`ExecutionRecord`]s, keyed by
/// world + player + action.
///
/// Every method may fail; the tracker surfaces those failures to its caller
/// because execution limits are only correct if their history is.
pub trait ExecutionStore: Send {
    /// Load every record stored for `world`.
    ///
    /// # Errors
    /// Returns an error if the backend cannot be read.
    fn load_world(&self, world: WorldId) -> Result<Vec<(PlayerId, ActionId, ExecutionRecord)>>;

    /// Insert or replace one record.
    ///
    /// # Errors
    /// Returns an error if the backend cannot be written.
    fn put(
        &self,
        world: WorldId,
        player: PlayerId,
        action: ActionId,
        record: &ExecutionRecord,
    ) -> Result<()>;

    /// Remove one record. Returns `true` if a record existed.
    ///
    /// # Errors
    /// Returns an error if the backend cannot be written.
    fn delete(&self, world: WorldId, player: PlayerId, action: ActionId) -> Result<bool>;
}

impl<T: ExecutionStore + Sync + ?Sized> ExecutionStore for Arc<T> {
    fn load_world(&self, world: WorldId) -> Result<Vec<(PlayerId, ActionId, ExecutionRecord)>> {
        (**self).load_world(world)
    }

    fn put(
        &self,
        world: WorldId,
        player: PlayerId,
        action: ActionId,
        record: &ExecutionRecord,
    ) -> Result<()> {
        (**self).put(world, player, action, record)
    }

    fn delete(&self, world: WorldId, player: PlayerId, action: ActionId) -> Result<bool> {
        (**self).delete(world, player, action)
    }
}

type RecordKey = (WorldId, PlayerId, ActionId);

/// Process-local store. Cloning shares the underlying map, which lets tests
/// simulate a restart by opening a second tracker on a clone.
#[derive(Debug, Clone, Default)]
pub struct MemoryExecutionStore {
    records: Arc<Mutex<HashMap<RecordKey, ExecutionRecord>>>,
}

impl MemoryExecutionStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records across all worlds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// Whether the store holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

impl ExecutionStore for MemoryExecutionStore {
    fn load_world(&self, world: WorldId) -> Result<Vec<(PlayerId, ActionId, ExecutionRecord)>> {
        Ok(self
            .records
            .lock()
            .iter()
            .filter(|((w, _, _), _)| *w == world)
            .map(|((_, player, action), record)| (*player, *action, record.clone()))
            .collect())
    }

    fn put(
        &self,
        world: WorldId,
        player: PlayerId,
        action: ActionId,
        record: &ExecutionRecord,
    ) -> Result<()> {
        self.records.lock().insert((world, player, action), record.clone());
        Ok(())
    }

    fn delete(&self, world: WorldId, player: PlayerId, action: ActionId) -> Result<bool> {
        Ok(self.records.lock().remove(&(world, player, action)).is_some())
    }
}
