use std::collections::BTreeSet;

use tracing::debug;

use studyhall_types::models::{FileGroups, FileId, UserFile};

use crate::ViewError;
use crate::cache::{Applied, FetchTicket, GroupCache};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCard {
    pub id: FileId,
    pub name: String,
}

impl From<&UserFile> for FileCard {
    fn from(file: &UserFile) -> Self {
        Self {
            id: file.id,
            name: file.name.clone(),
        }
    }
}

/// Synthetic card standing in for a group in the default view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupCard {
    pub name: String,
    pub count: usize,
}

/// Everything the file browser shows for one state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedView {
    pub title: String,
    pub visible_files: Vec<FileCard>,
    pub group_cards: Vec<GroupCard>,
    pub delete_group_visible: bool,
}

impl RenderedView {
    pub fn visible_ids(&self) -> Vec<FileId> {
        self.visible_files.iter().map(|f| f.id).collect()
    }
}

/// File browser state: the file list, the group cache and which group (if
/// any) is open. Every render is recomputed from scratch from the latest
/// snapshot.
#[derive(Debug)]
pub struct FileBrowser {
    title: String,
    files: Vec<FileCard>,
    cache: GroupCache,
    current: Option<String>,
}

impl FileBrowser {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            files: Vec::new(),
            cache: GroupCache::new(),
            current: None,
        }
    }

    pub fn set_files<'a>(&mut self, files: impl IntoIterator<Item = &'a UserFile>) {
        self.files = files.into_iter().map(FileCard::from).collect();
    }

    pub fn current_view(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn cache(&self) -> &GroupCache {
        &self.cache
    }

    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.cache.begin_fetch()
    }

    /// Install a completed fetch. Files and groups are accepted or dropped
    /// together, so a superseded response never mixes with a newer one. If
    /// the open group no longer exists the browser falls back to the default
    /// view.
    pub fn apply_fetch(&mut self, ticket: FetchTicket, files: &[UserFile], groups: FileGroups) -> Applied {
        let applied = self.cache.complete(ticket, groups);
        if applied == Applied::Installed {
            self.set_files(files);
            if let Some(name) = &self.current {
                if !self.has_group(name) {
                    debug!(group = %name, "Open group vanished, returning to default view");
                    self.current = None;
                }
            }
        }
        applied
    }

    /// Any group mutation must call this; the next fetch replaces the snapshot.
    pub fn invalidate(&mut self) {
        self.cache.invalidate();
    }

    pub fn open_group(&mut self, name: &str) -> Result<RenderedView, ViewError> {
        if !self.has_group(name) {
            return Err(ViewError::UnknownGroup(name.to_string()));
        }
        self.current = Some(name.to_string());
        Ok(self.render())
    }

    /// Activating the title in a group view returns to the default view.
    pub fn exit_group_view(&mut self) -> RenderedView {
        self.current = None;
        self.render()
    }

    pub fn render(&self) -> RenderedView {
        let snapshot = self.cache.snapshot();

        match (&self.current, snapshot) {
            (Some(name), Some(snap)) => {
                let members: BTreeSet<FileId> = snap
                    .groups
                    .get(name)
                    .map(|ids| ids.iter().copied().collect())
                    .unwrap_or_default();

                RenderedView {
                    title: name.clone(),
                    visible_files: self
                        .files
                        .iter()
                        .filter(|f| members.contains(&f.id))
                        .cloned()
                        .collect(),
                    group_cards: Vec::new(),
                    delete_group_visible: true,
                }
            }
            _ => {
                let grouped = snapshot.map(|s| s.grouped_ids()).unwrap_or_default();
                let group_cards = snapshot
                    .map(|s| {
                        s.groups
                            .iter()
                            .map(|(name, ids)| GroupCard {
                                name: name.clone(),
                                count: ids.len(),
                            })
                            .collect()
                    })
                    .unwrap_or_default();

                RenderedView {
                    title: self.title.clone(),
                    visible_files: self
                        .files
                        .iter()
                        .filter(|f| !grouped.contains(&f.id))
                        .cloned()
                        .collect(),
                    group_cards,
                    delete_group_visible: false,
                }
            }
        }
    }

    fn has_group(&self, name: &str) -> bool {
        self.cache
            .snapshot()
            .is_some_and(|s| s.groups.contains_key(name))
    }
}
