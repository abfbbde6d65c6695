use tracing::{debug, info};

use studyhall_db::{Database, classes, messages, sharing, users};
use studyhall_types::models::{ClassChatMessage, ClassId, Message, UnreadCounts, UserId};

use crate::authz::ClassAccess;
use crate::{CoreError, Result, validate_content};

/// Page size ceiling for chat and conversation listings.
pub const MAX_PAGE: u32 = 200;

pub fn send_message(db: &Database, sender_id: UserId, recipient_id: UserId, content: &str) -> Result<Message> {
    let content = validate_content(content)?;
    db.transaction(|conn| {
        if !users::exists(conn, recipient_id)? {
            return Err(CoreError::NotFound("Recipient"));
        }
        let message = messages::insert(conn, sender_id, recipient_id, content)?;
        debug!(message_id = message.id, sender_id, recipient_id, "Message sent");
        Ok(message)
    })
}

pub fn conversation(
    db: &Database,
    user_id: UserId,
    other_id: UserId,
    limit: u32,
    before: Option<i64>,
) -> Result<Vec<Message>> {
    let limit = limit.min(MAX_PAGE);
    db.with_conn(|conn| Ok(messages::conversation(conn, user_id, other_id, limit, before)?))
}

/// Only the recipient may mark a message read; repeat calls keep the first `read_at`.
pub fn mark_message_read(db: &Database, message_id: i64, reader_id: UserId) -> Result<Message> {
    db.transaction(|conn| {
        let message = messages::get(conn, message_id)?.ok_or(CoreError::NotFound("Message"))?;
        if message.recipient_id != reader_id {
            return Err(CoreError::Forbidden);
        }
        if message.is_read {
            return Ok(message);
        }

        messages::mark_read(conn, message_id)?;
        messages::get(conn, message_id)?.ok_or(CoreError::NotFound("Message"))
    })
}

/// Sender must own or belong to the class at the time of writing.
pub fn send_class_chat(
    db: &Database,
    sender_id: UserId,
    class_id: ClassId,
    content: &str,
) -> Result<ClassChatMessage> {
    let content = validate_content(content)?;
    db.transaction(|conn| {
        let access = ClassAccess::load(conn, sender_id, class_id)?;
        access.require_owner_or_member()?;

        let message = classes::insert_chat(conn, class_id, sender_id, content)?;
        info!(class_id, sender_id, message_id = message.id, "Class chat message");
        Ok(message)
    })
}

pub fn list_class_chat(
    db: &Database,
    actor_id: UserId,
    class_id: ClassId,
    limit: u32,
    before: Option<i64>,
) -> Result<Vec<ClassChatMessage>> {
    let limit = limit.min(MAX_PAGE);
    db.with_conn(|conn| {
        ClassAccess::load(conn, actor_id, class_id)?.require_owner_or_member()?;
        Ok(classes::list_chat(conn, class_id, limit, before)?)
    })
}

/// Unread direct messages and shared files addressed to the user.
pub fn unread_counts(db: &Database, user_id: UserId) -> Result<UnreadCounts> {
    db.with_conn(|conn| {
        Ok(UnreadCounts {
            messages: messages::count_unread(conn, user_id)?,
            shared_files: sharing::count_unread(conn, user_id)?,
        })
    })
}
