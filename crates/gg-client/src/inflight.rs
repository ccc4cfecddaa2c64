//! Per-gossip in-flight markers.
//!
//! At most one mutation runs per gossip id; different ids proceed
//! independently. A marker is held by an [`InFlightGuard`] and cleared when
//! the guard drops, whether the mutation succeeded or not.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use uuid::Uuid;

use crate::error::ClientError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InFlight {
    Deleting,
    Reposting,
}

#[derive(Debug, Default)]
pub struct InFlightMarkers {
    markers: DashMap<Uuid, InFlight>,
}

impl InFlightMarkers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `id` as busy with `kind`, or reports what it is already doing.
    pub fn begin(&self, id: Uuid, kind: InFlight) -> Result<InFlightGuard<'_>, ClientError> {
        match self.markers.entry(id) {
            Entry::Occupied(current) => Err(ClientError::Busy { id, kind: *current.get() }),
            Entry::Vacant(slot) => {
                slot.insert(kind);
                Ok(InFlightGuard { markers: self, id })
            }
        }
    }

    pub fn get(&self, id: Uuid) -> Option<InFlight> {
        self.markers.get(&id).map(|marker| *marker)
    }

    pub fn is_busy(&self, id: Uuid) -> bool {
        self.markers.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }
}

#[must_use = "the marker is cleared as soon as the guard is dropped"]
#[derive(Debug)]
pub struct InFlightGuard<'a> {
    markers: &'a InFlightMarkers,
    id: Uuid,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.markers.markers.remove(&self.id);
    }
}
