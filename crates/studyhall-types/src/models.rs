use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Store-assigned identifiers. Monotonic, never reused.
pub type UserId = i64;
pub type ClassId = i64;
pub type FileId = i64;
pub type FolderId = i64;

/// Ad-hoc file groups for one user: group name -> member file ids.
pub type FileGroups = BTreeMap<String, Vec<FileId>>;

/// Entry in the local user directory. Identities are issued elsewhere; this
/// is only the mirror used for display names and recipient checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Class {
    pub id: ClassId,
    pub name: String,
    #[serde(alias = "joinCode")]
    pub join_code: String,
    #[serde(alias = "ownerId")]
    pub owner_id: UserId,
    #[serde(alias = "allowJoin")]
    pub allow_join: bool,
    #[serde(alias = "createdAt")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassMembership {
    pub id: i64,
    pub user_id: UserId,
    pub class_id: ClassId,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassChatMessage {
    pub id: i64,
    pub class_id: ClassId,
    pub sender_id: UserId,
    pub content: String,
    pub sent_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    pub id: FolderId,
    pub name: String,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
}

/// File metadata. The bytes live in external storage; only the folder
/// assignment is managed here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserFile {
    pub id: FileId,
    pub owner_id: UserId,
    pub name: String,
    pub size: i64,
    pub folder_id: Option<FolderId>,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedFile {
    pub id: i64,
    pub sender_id: UserId,
    pub recipient_id: UserId,
    pub original_file_id: FileId,
    pub shared_file_name: String,
    pub description: Option<String>,
    pub shared_at: DateTime<Utc>,
    pub is_read: bool,
    pub read_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub sender_id: UserId,
    pub recipient_id: UserId,
    pub content: String,
    pub sent_at: DateTime<Utc>,
    pub is_read: bool,
    pub read_at: Option<DateTime<Utc>>,
}

/// Read-side projection of a class: the owner is reported as `teacher`,
/// members as `students`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassDetails {
    #[serde(alias = "Class")]
    pub class: Class,
    #[serde(alias = "Teacher", alias = "owner")]
    pub teacher: User,
    #[serde(alias = "Students", alias = "members")]
    pub students: Vec<User>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnreadCounts {
    pub messages: u64,
    pub shared_files: u64,
}

/// Which files to list: everything, only unfiled, or one folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FolderFilter {
    All,
    Unfiled,
    Folder(FolderId),
}
