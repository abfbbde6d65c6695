use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::debug;

use studyhall_types::models::{FileGroups, FileId};

/// One authoritative fetch of the user's groups. Never mutated; a newer
/// fetch replaces it wholesale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSnapshot {
    pub generation: u64,
    pub groups: Arc<FileGroups>,
}

impl GroupSnapshot {
    /// Union of every file id across every group.
    pub fn grouped_ids(&self) -> BTreeSet<FileId> {
        self.groups.values().flatten().copied().collect()
    }
}

/// Issued when a fetch starts; only the most recently issued ticket may
/// install its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    generation: u64,
}

impl FetchTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Installed,
    /// A newer fetch was started after this one; its result was dropped.
    Stale,
}

#[derive(Debug, Default)]
pub struct GroupCache {
    issued: u64,
    snapshot: Option<GroupSnapshot>,
    stale: bool,
}

impl GroupCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.issued += 1;
        FetchTicket {
            generation: self.issued,
        }
    }

    pub fn complete(&mut self, ticket: FetchTicket, groups: FileGroups) -> Applied {
        if ticket.generation != self.issued {
            debug!(
                generation = ticket.generation,
                latest = self.issued,
                "Dropping superseded group fetch"
            );
            return Applied::Stale;
        }

        self.snapshot = Some(GroupSnapshot {
            generation: ticket.generation,
            groups: Arc::new(groups),
        });
        self.stale = false;
        Applied::Installed
    }

    /// Mark the snapshot as out of date after a mutation. The old snapshot
    /// stays readable until the refetch lands.
    pub fn invalidate(&mut self) {
        self.stale = true;
    }

    pub fn needs_refetch(&self) -> bool {
        self.stale || self.snapshot.is_none()
    }

    pub fn snapshot(&self) -> Option<&GroupSnapshot> {
        self.snapshot.as_ref()
    }
}
