use rusqlite::Connection;
use tracing::info;

use crate::Result;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            BEGIN;

            CREATE TABLE users (
                id          INTEGER PRIMARY KEY,
                username    TEXT NOT NULL,
                created_at  TEXT NOT NULL
            );

            CREATE TABLE classes (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                name        TEXT NOT NULL,
                join_code   TEXT NOT NULL UNIQUE CHECK (length(join_code) <= 12),
                owner_id    INTEGER NOT NULL REFERENCES users(id) ON DELETE RESTRICT,
                allow_join  INTEGER NOT NULL DEFAULT 1,
                created_at  TEXT NOT NULL
            );

            CREATE INDEX idx_classes_owner ON classes(owner_id);

            CREATE TABLE class_members (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id     INTEGER NOT NULL REFERENCES users(id) ON DELETE RESTRICT,
                class_id    INTEGER NOT NULL REFERENCES classes(id) ON DELETE CASCADE,
                joined_at   TEXT NOT NULL,
                UNIQUE(user_id, class_id)
            );

            CREATE INDEX idx_class_members_class ON class_members(class_id);

            CREATE TABLE class_messages (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                class_id    INTEGER NOT NULL REFERENCES classes(id) ON DELETE CASCADE,
                sender_id   INTEGER NOT NULL REFERENCES users(id) ON DELETE RESTRICT,
                content     TEXT NOT NULL,
                sent_at     TEXT NOT NULL
            );

            CREATE INDEX idx_class_messages_class ON class_messages(class_id, id);

            CREATE TABLE folders (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                name        TEXT NOT NULL CHECK (length(name) <= 100),
                user_id     INTEGER NOT NULL REFERENCES users(id) ON DELETE RESTRICT,
                created_at  TEXT NOT NULL,
                UNIQUE(user_id, name)
            );

            CREATE TABLE files (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                owner_id    INTEGER NOT NULL REFERENCES users(id) ON DELETE RESTRICT,
                name        TEXT NOT NULL,
                size        INTEGER NOT NULL,
                folder_id   INTEGER REFERENCES folders(id) ON DELETE RESTRICT,
                uploaded_at TEXT NOT NULL
            );

            CREATE INDEX idx_files_owner ON files(owner_id, folder_id);

            CREATE TABLE file_groups (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id     INTEGER NOT NULL REFERENCES users(id) ON DELETE RESTRICT,
                name        TEXT NOT NULL,
                UNIQUE(user_id, name)
            );

            CREATE TABLE file_group_items (
                group_id    INTEGER NOT NULL REFERENCES file_groups(id) ON DELETE CASCADE,
                file_id     INTEGER NOT NULL REFERENCES files(id) ON DELETE CASCADE,
                PRIMARY KEY (group_id, file_id)
            );

            CREATE TABLE shared_files (
                id                  INTEGER PRIMARY KEY AUTOINCREMENT,
                sender_id           INTEGER NOT NULL REFERENCES users(id) ON DELETE RESTRICT,
                recipient_id        INTEGER NOT NULL REFERENCES users(id) ON DELETE RESTRICT,
                original_file_id    INTEGER NOT NULL REFERENCES files(id) ON DELETE CASCADE,
                shared_file_name    TEXT NOT NULL,
                description         TEXT,
                shared_at           TEXT NOT NULL,
                is_read             INTEGER NOT NULL DEFAULT 0,
                read_at             TEXT
            );

            CREATE INDEX idx_shared_files_recipient ON shared_files(recipient_id, is_read);

            CREATE TABLE messages (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                sender_id       INTEGER NOT NULL REFERENCES users(id) ON DELETE RESTRICT,
                recipient_id    INTEGER NOT NULL REFERENCES users(id) ON DELETE RESTRICT,
                content         TEXT NOT NULL,
                sent_at         TEXT NOT NULL,
                is_read         INTEGER NOT NULL DEFAULT 0,
                read_at         TEXT
            );

            CREATE INDEX idx_messages_recipient ON messages(recipient_id, is_read);

            INSERT INTO schema_version (version) VALUES (1);

            COMMIT;
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
