use studyhall_db::{Database, users};
use studyhall_types::models::{Class, UserFile, UserId};

pub const OWNER: UserId = 1;
pub const STUDENT: UserId = 2;
pub const OUTSIDER: UserId = 3;

pub fn seeded() -> Database {
    let db = Database::open_in_memory().unwrap();
    db.with_conn(|conn| {
        users::upsert(conn, OWNER, "teacher")?;
        users::upsert(conn, STUDENT, "student")?;
        users::upsert(conn, OUTSIDER, "outsider")
    })
    .unwrap();
    db
}

pub fn with_class() -> (Database, Class) {
    let db = seeded();
    let class = crate::membership::create_class(&db, OWNER, "Biology").unwrap();
    (db, class)
}

pub fn file(db: &Database, owner: UserId, name: &str) -> UserFile {
    crate::files::register_file(db, owner, name, 1024).unwrap()
}
