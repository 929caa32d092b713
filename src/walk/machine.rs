use ron::ser::PrettyConfig;

use crate::error::{Result, WalkError};
use crate::persistence::store::KvStore;

use super::model::{Step, Walk};

/// Store key holding the serialized walk.
pub const WALK_KEY: &str = "walk";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WalkPhase {
    Empty,
    InProgress,
}

/// Owns the walk and keeps the store in sync with it.
///
/// Every transition swaps in a new `Walk` value and then writes a snapshot.
/// A failed write is logged and the in-memory walk carries on.
pub struct WalkMachine<S: KvStore> {
    walk: Walk,
    store: S,
}

pub fn snapshot(walk: &Walk) -> Result<String> {
    let pretty = PrettyConfig::new().separate_tuple_members(true);
    ron::ser::to_string_pretty(walk, pretty).map_err(|e| WalkError::Persistence(e.to_string()))
}

pub fn parse_snapshot(serialized: &str) -> Result<Walk> {
    let walk: Walk = ron::from_str(serialized).map_err(|e| WalkError::Restore(e.to_string()))?;
    walk.validate().map_err(|e| WalkError::Restore(e.to_string()))?;
    Ok(walk)
}

impl<S: KvStore> WalkMachine<S> {
    /// Empty walk; the store is not consulted.
    pub fn new(store: S) -> Self {
        Self { walk: Walk::new(), store }
    }

    /// Start from whatever walk the store holds. A missing, unreadable or
    /// unparsable value leaves the walk empty.
    pub fn open(store: S) -> Self {
        let mut machine = Self::new(store);
        match machine.store.get(WALK_KEY) {
            Ok(Some(serialized)) => {
                if let Err(e) = machine.restore(&serialized) {
                    log::warn!("Could not load Walk from session: {}", e);
                }
            }
            Ok(None) => {}
            Err(e) => log::warn!("Could not read stored Walk: {}", e),
        }
        machine
    }

    pub fn walk(&self) -> &Walk { &self.walk }
    pub fn store(&self) -> &S { &self.store }

    pub fn phase(&self) -> WalkPhase {
        if self.walk.is_empty() { WalkPhase::Empty } else { WalkPhase::InProgress }
    }

    pub fn append(&mut self, step: Step) {
        self.walk = self.walk.appended(step);
        self.persist();
    }

    /// Drop the step at `from` and everything after it.
    pub fn truncate(&mut self, from: usize) {
        self.walk = self.walk.truncated(from);
        self.persist();
    }

    pub fn clear(&mut self) {
        self.truncate(0);
    }

    /// Replace the walk with a serialized one. On failure the current walk
    /// is kept and the error is returned for the caller to report.
    pub fn restore(&mut self, serialized: &str) -> Result<()> {
        self.walk = parse_snapshot(serialized)?;
        Ok(())
    }

    pub fn snapshot(&self) -> Result<String> {
        snapshot(&self.walk)
    }

    fn persist(&mut self) {
        let serialized = match self.snapshot() {
            Ok(s) => s,
            Err(e) => {
                log::warn!("Could not store Walk: {}", e);
                return;
            }
        };
        if let Err(e) = self.store.set(WALK_KEY, &serialized) {
            log::warn!("Could not store Walk: {}", e);
        }
    }
}
