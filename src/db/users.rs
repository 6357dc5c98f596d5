// Copyright (c) 2026 footfall contributors
// Licensed under the MIT License. See LICENSE file in the project root.

use anyhow::Result;
use rusqlite::{params, OptionalExtension};
use serde::{Deserialize, Serialize};

use super::Database;
use crate::error::CounterError;

/// Stored credentials
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub password_hash: String,
}

impl Database {
    /// Insert a user; fails if the username is taken
    pub fn insert_user(&self, user: &User) -> Result<()> {
        let conn = self.conn.lock();
        let result = conn.execute(
            "INSERT INTO users (username, password_hash) VALUES (?1, ?2)",
            params![user.username, user.password_hash],
        );

        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(CounterError::UserExists.into())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn get_user(&self, username: &str) -> Result<Option<User>> {
        let conn = self.conn.lock();
        let user = conn
            .query_row(
                "SELECT username, password_hash FROM users WHERE username = ?1",
                params![username],
                |row| {
                    Ok(User {
                        username: row.get(0)?,
                        password_hash: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_username_is_rejected() {
        let db = Database::open_in_memory().unwrap();
        let user = User {
            username: "ana".into(),
            password_hash: "abc".into(),
        };

        db.insert_user(&user).unwrap();
        let err = db.insert_user(&user).unwrap_err();
        assert_eq!(err.downcast_ref::<CounterError>(), Some(&CounterError::UserExists));

        assert_eq!(db.get_user("ana").unwrap(), Some(user));
        assert!(db.get_user("bob").unwrap().is_none());
    }
}
