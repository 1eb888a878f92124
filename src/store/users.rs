/*!
`Store` methods for dealing with registered users.

Users are only ever inserted (on registration) and read (on login).
*/
use rusqlite::Row;
use serde::Serialize;

use super::{DbError, Store};
use crate::auth;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip)]
    pub password_hash: String,
    #[serde(skip)]
    pub salt: String,
}

fn user_from_row(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get("id")?,
        name: row.get("name")?,
        email: row.get("email")?,
        password_hash: row.get("password")?,
        salt: row.get("salt")?,
    })
}

impl Store {
    /**
    Insert a new user and return the generated id.

    There is no check for an existing user with the same `email`; two
    accounts may share one.
    */
    pub async fn insert_user(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<i64, DbError> {
        log::trace!("Store::insert_user( {:?}, {:?}, [ password ] ) called.", name, email);

        let salt = self.generate_salt()?;
        let name = name.to_owned();
        let email = email.to_owned();
        let password = password.to_owned();

        self.run(move |conn| {
            let hash = auth::hash_password(&password, &salt)?;
            conn.execute(
                "INSERT INTO users (name, email, password, salt)
                    VALUES (?1, ?2, ?3, ?4)",
                [&name, &email, &hash, &salt]
            )?;
            Ok(conn.last_insert_rowid())
        }).await
    }

    /// All users registered with exactly `email`, oldest first.
    pub async fn get_users_by_email(&self, email: &str) -> Result<Vec<User>, DbError> {
        log::trace!("Store::get_users_by_email( {:?} ) called.", email);

        let email = email.to_owned();
        self.run(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, email, password, salt FROM users
                    WHERE email = ?1 ORDER BY id"
            )?;
            let users = stmt.query_map([&email], user_from_row)?
                .collect::<Result<Vec<User>, _>>()?;
            Ok(users)
        }).await
    }

    /**
    Return the first user (by id) registered with exactly `email` whose
    password is `password`, if there is one.

    Email comparison is exact and case-sensitive.
    */
    pub async fn check_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<User>, DbError> {
        log::trace!("Store::check_password( {:?}, [ password ] ) called.", email);

        let candidates = self.get_users_by_email(email).await?;
        if candidates.is_empty() {
            log::trace!("    ...no user with email {:?}.", email);
            return Ok(None);
        }

        let password = password.to_owned();
        tokio::task::spawn_blocking(move || -> Result<Option<User>, DbError> {
            for u in candidates.into_iter() {
                if auth::verify_password(&password, &u.salt, &u.password_hash)? {
                    return Ok(Some(u));
                }
            }
            Ok(None)
        }).await?
    }
}
