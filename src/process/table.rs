/*!
 * Process Table
 *
 * Arena of process records keyed by a stable `ProcessId`. Queues, the
 * monitor, the fallback-shell slot and explicit holders store ids and count
 * as holders; a record is dropped, closing its kernel handle, as soon as the
 * last holder lets go.
 */

use super::applet::AppletProcess;
use crate::core::errors::{TrackerError, TrackerResult};
use crate::core::types::ProcessId;
use ahash::RandomState;
use log::debug;
use std::collections::HashMap;

struct Entry {
    process: AppletProcess,
    holders: u32,
}

pub struct ProcessTable {
    entries: HashMap<ProcessId, Entry, RandomState>,
    next_id: u64,
}

impl ProcessTable {
    pub fn new() -> Self {
        Self {
            entries: HashMap::with_hasher(RandomState::new()),
            next_id: 1,
        }
    }

    /// Add a record with a single holder (the caller)
    pub fn insert(&mut self, process: AppletProcess) -> ProcessId {
        let id = ProcessId::from_raw(self.next_id);
        self.next_id += 1;
        self.entries.insert(
            id,
            Entry {
                process,
                holders: 1,
            },
        );
        id
    }

    pub fn retain(&mut self, id: ProcessId) -> TrackerResult<()> {
        let entry = self
            .entries
            .get_mut(&id)
            .ok_or(TrackerError::UnknownProcess(id))?;
        entry.holders += 1;
        Ok(())
    }

    /// Drop one hold; returns the record if that was the last one
    pub fn release(&mut self, id: ProcessId) -> Option<AppletProcess> {
        let entry = self.entries.get_mut(&id)?;
        entry.holders = entry.holders.saturating_sub(1);
        if entry.holders > 0 {
            return None;
        }
        debug!("Releasing process record {}", id);
        self.entries.remove(&id).map(|entry| entry.process)
    }

    pub fn get(&self, id: ProcessId) -> Option<&AppletProcess> {
        self.entries.get(&id).map(|entry| &entry.process)
    }

    pub fn get_mut(&mut self, id: ProcessId) -> Option<&mut AppletProcess> {
        self.entries.get_mut(&id).map(|entry| &mut entry.process)
    }

    pub(crate) fn lookup(&self, id: ProcessId) -> TrackerResult<&AppletProcess> {
        self.get(id).ok_or(TrackerError::UnknownProcess(id))
    }

    pub(crate) fn lookup_mut(&mut self, id: ProcessId) -> TrackerResult<&mut AppletProcess> {
        self.get_mut(id).ok_or(TrackerError::UnknownProcess(id))
    }

    /// Records in id order
    pub fn iter(&self) -> impl Iterator<Item = (ProcessId, &AppletProcess)> + '_ {
        let mut ids: Vec<ProcessId> = self.entries.keys().copied().collect();
        ids.sort_unstable();
        ids.into_iter()
            .filter_map(move |id| self.get(id).map(|process| (id, process)))
    }

    pub fn holders(&self, id: ProcessId) -> Option<u32> {
        self.entries.get(&id).map(|entry| entry.holders)
    }

    pub fn contains(&self, id: ProcessId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ProcessTable {
    fn default() -> Self {
        Self::new()
    }
}
