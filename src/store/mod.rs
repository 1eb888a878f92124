/*!
Database interaction module.

The SQLite file to which this connects is meant to have the following four
independent tables.

```sql
CREATE TABLE users (
    id       INTEGER PRIMARY KEY AUTOINCREMENT,
    name     TEXT NOT NULL,
    email    TEXT NOT NULL,     /* not unique; duplicates are allowed */
    password TEXT NOT NULL,     /* base64 argon2id hash */
    salt     TEXT NOT NULL
);

CREATE TABLE students (
    id    INTEGER PRIMARY KEY AUTOINCREMENT,
    name  TEXT NOT NULL,
    age   INTEGER NOT NULL,
    grade TEXT NOT NULL
);

CREATE TABLE courses (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    course_name TEXT NOT NULL,
    teacher     TEXT NOT NULL
);

CREATE TABLE assignments (
    id       INTEGER PRIMARY KEY AUTOINCREMENT,
    title    TEXT NOT NULL,
    due_date TEXT NOT NULL,
    status   TEXT NOT NULL DEFAULT 'Pending'
);
```

Every operation opens its own connection on the blocking thread pool, runs
a single statement, and drops the connection before returning.
*/
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rand::{Rng, distributions};
use rusqlite::{Connection, OptionalExtension, Row, params_from_iter, types::Value};
use serde::de::DeserializeOwned;

use crate::auth::AuthError;

pub mod assignments;
pub mod courses;
pub mod students;
pub mod users;

pub use assignments::{Assignment, AssignmentChanges, NewAssignment};
pub use courses::{Course, NewCourse};
pub use students::{NewStudent, Student};
pub use users::User;

const DEFAULT_SALT_LENGTH: usize = 16;
/// argon2 refuses salts shorter than this.
#[cfg(test)]
const MIN_SALT_LENGTH: usize = 8;
const DEFAULT_SALT_CHARS: &str =
"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

static SCHEMA: &[(&str, &str, &str)] = &[
    (
        "users",
        "CREATE TABLE IF NOT EXISTS users (
            id       INTEGER PRIMARY KEY AUTOINCREMENT,
            name     TEXT NOT NULL,
            email    TEXT NOT NULL,
            password TEXT NOT NULL,
            salt     TEXT NOT NULL
        )",
        "DROP TABLE IF EXISTS users",
    ),

    (
        "students",
        "CREATE TABLE IF NOT EXISTS students (
            id    INTEGER PRIMARY KEY AUTOINCREMENT,
            name  TEXT NOT NULL,
            age   INTEGER NOT NULL,
            grade TEXT NOT NULL
        )",
        "DROP TABLE IF EXISTS students",
    ),

    (
        "courses",
        "CREATE TABLE IF NOT EXISTS courses (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            course_name TEXT NOT NULL,
            teacher     TEXT NOT NULL
        )",
        "DROP TABLE IF EXISTS courses",
    ),

    (
        "assignments",
        "CREATE TABLE IF NOT EXISTS assignments (
            id       INTEGER PRIMARY KEY AUTOINCREMENT,
            title    TEXT NOT NULL,
            due_date TEXT NOT NULL,
            status   TEXT NOT NULL DEFAULT 'Pending'
        )",
        "DROP TABLE IF EXISTS assignments",
    ),
];

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("Data DB: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Data DB task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("{0}")]
    Other(String),
}

impl DbError {
    /// Prepend some contextual `annotation` for the error.
    fn annotate(self, annotation: &str) -> Self {
        DbError::Other(format!("{}: {}", annotation, &self))
    }
}

/**
A flat table of records that all share the same lifecycle: list, get by id,
insert, full-row overwrite, and delete.

`Fields` is everything but the generated `id`; it's what a create or update
form supplies.
*/
pub trait Record: Debug + Sized + Send + 'static {
    type Fields: Debug + DeserializeOwned + Send + 'static;

    const TABLE: &'static str;
    /// Mutable columns, in the same order `values()` produces them.
    const COLUMNS: &'static [&'static str];

    fn from_row(row: &Row) -> rusqlite::Result<Self>;
    fn values(fields: Self::Fields) -> Vec<Value>;
}

fn select_sql<R: Record>() -> String {
    format!("SELECT id, {} FROM {}", R::COLUMNS.join(", "), R::TABLE)
}

#[derive(Debug)]
pub struct Store {
    db_path: PathBuf,
    salt_chars: Vec<char>,
    salt_length: usize,
}

impl Store {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Self {
        let db_path = db_path.as_ref().to_path_buf();
        log::trace!("Store::new( {} ) called.", db_path.display());

        let salt_chars: Vec<char> = DEFAULT_SALT_CHARS.chars().collect();
        let salt_length = DEFAULT_SALT_LENGTH;

        Self { db_path, salt_chars, salt_length }
    }

    #[cfg(test)]
    pub fn db_path(&self) -> &Path { &self.db_path }

    /// Set characters to use when generating user salt strings.
    ///
    /// Will quietly do nothing if `new_chars` has zero length.
    #[cfg(test)]
    pub fn set_salt_chars(&mut self, new_chars: &str) {
        if !new_chars.is_empty() {
            self.salt_chars = new_chars.chars().collect();
        }
    }

    /// Set the length of salt strings to generate.
    ///
    /// Will quietly do nothing if set below the minimum argon2 accepts.
    #[cfg(test)]
    pub fn set_salt_length(&mut self, new_length: usize) {
        if new_length >= MIN_SALT_LENGTH {
            self.salt_length = new_length;
        }
    }

    /// Generate a new user salt based on the current values of
    /// self.salt_chars and self.salt_length.
    fn generate_salt(&self) -> Result<String, DbError> {
        let dist = distributions::Slice::new(&self.salt_chars)
            .map_err(|e| DbError::Other(format!("Unable to generate salt: {:?}", &e)))?;
        let rng = rand::thread_rng();
        let new_salt: String = rng.sample_iter(&dist)
            .take(self.salt_length)
            .collect();
        Ok(new_salt)
    }

    /**
    Run `f` against a fresh connection on the blocking thread pool.

    The connection lives exactly as long as the closure; it's dropped (and
    so closed) however `f` exits.
    */
    async fn run<T, F>(&self, f: F) -> Result<T, DbError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, DbError> + Send + 'static,
    {
        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || -> Result<T, DbError> {
            let conn = connect(&db_path)?;
            f(&conn)
        }).await?
    }

    pub async fn ensure_db_schema(&self) -> Result<(), DbError> {
        log::trace!("Store::ensure_db_schema() called.");

        self.run(|conn| {
            for (table, create_stmt, _) in SCHEMA.iter() {
                log::trace!("Ensuring table {:?} exists.", table);
                conn.execute(create_stmt, [])
                    .map_err(|e| DbError::from(e)
                        .annotate(&format!("Unable to create table {:?}", table)))?;
            }
            Ok(())
        }).await
    }

    /// Every row of `R`'s table, in insertion order.
    pub async fn list<R: Record>(&self) -> Result<Vec<R>, DbError> {
        log::trace!("Store::list::<{}>() called.", R::TABLE);

        self.run(|conn| {
            let mut stmt = conn.prepare(&format!("{} ORDER BY id", select_sql::<R>()))?;
            let rows = stmt.query_map([], |row| R::from_row(row))?
                .collect::<Result<Vec<R>, _>>()?;
            Ok(rows)
        }).await
    }

    pub async fn get<R: Record>(&self, id: i64) -> Result<Option<R>, DbError> {
        log::trace!("Store::get::<{}>( {} ) called.", R::TABLE, &id);

        self.run(move |conn| {
            let r = conn.query_row(
                &format!("{} WHERE id = ?1", select_sql::<R>()),
                [id],
                |row| R::from_row(row)
            ).optional()?;
            Ok(r)
        }).await
    }

    /// Insert a new row and return its generated id.
    pub async fn insert<R: Record>(&self, fields: R::Fields) -> Result<i64, DbError> {
        log::trace!("Store::insert::<{}>( {:?} ) called.", R::TABLE, &fields);

        self.run(move |conn| {
            let placeholders: Vec<String> = (1..=R::COLUMNS.len())
                .map(|n| format!("?{}", n))
                .collect();
            let stmt = format!(
                "INSERT INTO {} ({}) VALUES ({})",
                R::TABLE, R::COLUMNS.join(", "), placeholders.join(", ")
            );
            conn.execute(&stmt, params_from_iter(R::values(fields)))?;
            Ok(conn.last_insert_rowid())
        }).await
    }

    /**
    Overwrite every mutable column of row `id`.

    There's no existence or version check; if `id` isn't there, nothing
    happens, and the last writer wins.
    */
    pub async fn update<R: Record>(&self, id: i64, fields: R::Fields) -> Result<(), DbError> {
        log::trace!("Store::update::<{}>( {}, {:?} ) called.", R::TABLE, &id, &fields);

        self.run(move |conn| {
            let assignments: Vec<String> = R::COLUMNS.iter().enumerate()
                .map(|(n, col)| format!("{} = ?{}", col, n + 1))
                .collect();
            let stmt = format!(
                "UPDATE {} SET {} WHERE id = ?{}",
                R::TABLE, assignments.join(", "), R::COLUMNS.len() + 1
            );
            let mut values = R::values(fields);
            values.push(Value::Integer(id));

            let n = conn.execute(&stmt, params_from_iter(values))?;
            if n == 0 {
                log::debug!("Update of {} row {} matched nothing.", R::TABLE, &id);
            }
            Ok(())
        }).await
    }

    /// Delete row `id` if it's there. Deleting a missing row is not an error.
    pub async fn delete<R: Record>(&self, id: i64) -> Result<(), DbError> {
        log::trace!("Store::delete::<{}>( {} ) called.", R::TABLE, &id);

        self.run(move |conn| {
            let n = conn.execute(
                &format!("DELETE FROM {} WHERE id = ?1", R::TABLE),
                [id]
            )?;
            log::trace!("    ...{} {} row(s) deleted.", &n, R::TABLE);
            Ok(())
        }).await
    }

    /**
    Drop all database tables to fully reset database state.

    This is only meant for cleanup after testing.
    */
    #[cfg(test)]
    pub async fn nuke_database(&self) -> Result<(), DbError> {
        log::trace!("Store::nuke_database() called.");

        self.run(|conn| {
            for (_, _, drop_stmt) in SCHEMA.iter().rev() {
                if let Err(e) = conn.execute(drop_stmt, []) {
                    log::error!("Error dropping: {:?}: {}", &drop_stmt, &e);
                }
            }
            Ok(())
        }).await
    }
}

fn connect(db_path: &Path) -> Result<Connection, DbError> {
    log::trace!("connect( {} ) called.", db_path.display());

    let conn = Connection::open(db_path)
        .map_err(|e| DbError::from(e).annotate("Unable to connect"))?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    Ok(conn)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::tests::ensure_logging;

    use tempfile::TempDir;

    /// A `Store` with a freshly-created schema in a throwaway directory.
    ///
    /// Hang on to the `TempDir`; the database goes away when it drops.
    pub async fn test_store() -> (TempDir, Store) {
        ensure_logging();

        let dir = tempfile::tempdir().unwrap();
        let db = Store::new(dir.path().join("test.db"));
        db.ensure_db_schema().await.unwrap();
        (dir, db)
    }

    #[tokio::test]
    async fn create_store() {
        let (_dir, db) = test_store().await;
        assert!(db.db_path().exists());

        // Schema creation is idempotent.
        db.ensure_db_schema().await.unwrap();
        db.nuke_database().await.unwrap();
    }

    #[tokio::test]
    async fn ids_are_not_reused() {
        let (_dir, db) = test_store().await;

        let a = db.insert::<Course>(NewCourse {
            course_name: "Algebra".to_owned(),
            teacher: "Ms Jenny".to_owned(),
        }).await.unwrap();
        db.delete::<Course>(a).await.unwrap();
        let b = db.insert::<Course>(NewCourse {
            course_name: "Geometry".to_owned(),
            teacher: "Mr Berro".to_owned(),
        }).await.unwrap();

        assert!(b > a);
    }

    #[test]
    fn salt_settings() {
        let mut db = Store::new("unused.db");
        db.set_salt_length(4);
        assert_eq!(db.salt_length, DEFAULT_SALT_LENGTH);
        db.set_salt_length(24);
        db.set_salt_chars("");
        db.set_salt_chars("xy");

        let salt = db.generate_salt().unwrap();
        assert_eq!(salt.len(), 24);
        assert!(salt.chars().all(|c| c == 'x' || c == 'y'));
    }
}
