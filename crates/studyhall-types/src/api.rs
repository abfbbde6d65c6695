use serde::{Deserialize, Serialize};

use crate::models::{
    Class, ClassChatMessage, FileGroups, FileId, Folder, FolderId, Message, SharedFile, UserFile,
    UserId,
};

// -- JWT Claims --

/// Claims issued by the identity provider. `sub` is the opaque user id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: UserId,
    pub username: String,
    pub exp: usize,
}

// -- Generic --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OkResponse {
    pub ok: bool,
}

impl OkResponse {
    pub fn ok() -> Self {
        Self { ok: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Cursor pagination for chat and conversation listings.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_limit")]
    pub limit: u32,
    /// Only return rows with an id below this one.
    pub before: Option<i64>,
}

fn default_limit() -> u32 {
    50
}

// -- Groups --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupsResponse {
    #[serde(alias = "Groups", alias = "GROUPS")]
    pub groups: FileGroups,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateGroupRequest {
    pub name: String,
    #[serde(default)]
    pub file_ids: Vec<FileId>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GroupFilesRequest {
    pub file_ids: Vec<FileId>,
}

// -- Folders & files --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FolderNameRequest {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct FolderResponse {
    pub folder: Folder,
}

#[derive(Debug, Serialize)]
pub struct FoldersResponse {
    pub folders: Vec<Folder>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterFileRequest {
    pub name: String,
    pub size: i64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MoveFileRequest {
    pub folder_id: Option<FolderId>,
}

/// `GET /files?folder_id=3` or `GET /files?unfiled=true`.
#[derive(Debug, Default, Deserialize)]
pub struct FileQuery {
    pub folder_id: Option<FolderId>,
    #[serde(default)]
    pub unfiled: bool,
}

#[derive(Debug, Serialize)]
pub struct FileResponse {
    pub file: UserFile,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FilesResponse {
    pub files: Vec<UserFile>,
}

// -- Classes --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateClassRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JoinClassRequest {
    pub code: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClassSettingsRequest {
    pub allow_join: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassResponse {
    #[serde(alias = "Class")]
    pub class: Class,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassesResponse {
    #[serde(alias = "Classes")]
    pub classes: Vec<Class>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendChatRequest {
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct ChatMessageResponse {
    pub message: ClassChatMessage,
}

#[derive(Debug, Serialize)]
pub struct ChatMessagesResponse {
    pub messages: Vec<ClassChatMessage>,
}

// -- Sharing & messaging --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShareFileRequest {
    pub recipient_id: UserId,
    pub file_id: FileId,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SharedFileResponse {
    pub shared_file: SharedFile,
}

#[derive(Debug, Serialize)]
pub struct SharedFilesResponse {
    pub shared_files: Vec<SharedFile>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendMessageRequest {
    pub recipient_id: UserId,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: Message,
}

#[derive(Debug, Serialize)]
pub struct MessagesResponse {
    pub messages: Vec<Message>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ClassDetails;

    #[test]
    fn groups_payload_accepts_capitalised_envelope() {
        let lower: GroupsResponse =
            serde_json::from_str(r#"{"groups": {"A": [1, 2], "B": [3]}}"#).unwrap();
        let upper: GroupsResponse =
            serde_json::from_str(r#"{"GROUPS": {"A": [1, 2], "B": [3]}}"#).unwrap();

        assert_eq!(lower.groups, upper.groups);
        // Group names are data, not field names, and keep their casing.
        assert!(upper.groups.contains_key("A"));
    }

    #[test]
    fn class_details_accepts_both_casings() {
        let body = r#"{
            "Class": {"id": 1, "name": "Bio", "joinCode": "abc", "ownerId": 7,
                      "allowJoin": true, "createdAt": "2024-01-01T00:00:00Z"},
            "Teacher": {"id": 7, "username": "t", "created_at": "2024-01-01T00:00:00Z"},
            "students": []
        }"#;
        let details: ClassDetails = serde_json::from_str(body).unwrap();
        assert_eq!(details.class.join_code, "abc");
        assert_eq!(details.teacher.id, details.class.owner_id);
    }

    #[test]
    fn page_query_defaults_limit() {
        let q: PageQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(q.limit, 50);
        assert!(q.before.is_none());
    }
}
