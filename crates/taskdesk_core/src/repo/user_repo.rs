//! Identity persistence: users, sessions and password-reset tokens.
//!
//! # Invariants
//! - Session and reset tokens are stored only as digests; raw tokens never
//!   reach this layer.
//! - `complete_password_reset` swaps the hash, burns the token and drops the
//!   user's sessions in one transaction.

use crate::db::ensure_connection_ready;
use crate::model::user::{User, UserId};
use crate::repo::{bool_to_int, parse_bool, parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};

const USER_SELECT_SQL: &str = "SELECT
    users.uuid AS uuid,
    users.username AS username,
    users.email AS email,
    users.password_hash AS password_hash,
    users.created_at AS created_at
FROM users";

/// Row written on registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub user: User,
    pub password_hash: String,
}

/// User plus the stored password hash, for credential checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserCredentials {
    pub user: User,
    pub password_hash: String,
}

/// Stored state of one password-reset token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResetTokenRecord {
    pub user_id: UserId,
    /// Unix epoch milliseconds, UTC.
    pub expires_at: i64,
    pub used: bool,
}

/// Repository interface for the identity store.
pub trait UserRepository {
    /// Inserts a user. A taken username yields `RepoError::Duplicate`.
    fn create_user(&self, new_user: &NewUser) -> RepoResult<()>;
    fn find_credentials(&self, username: &str) -> RepoResult<Option<UserCredentials>>;
    fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>>;
    fn insert_session(
        &self,
        token_digest: &str,
        user_id: UserId,
        created_at: i64,
    ) -> RepoResult<()>;
    fn find_session_user(&self, token_digest: &str) -> RepoResult<Option<User>>;
    /// Returns whether a session row was removed.
    fn delete_session(&self, token_digest: &str) -> RepoResult<bool>;
    fn insert_reset_token(
        &self,
        token_digest: &str,
        user_id: UserId,
        expires_at: i64,
    ) -> RepoResult<()>;
    fn find_reset_token(&self, token_digest: &str) -> RepoResult<Option<ResetTokenRecord>>;
    fn complete_password_reset(
        &self,
        token_digest: &str,
        user_id: UserId,
        password_hash: &str,
    ) -> RepoResult<()>;
}

/// SQLite-backed identity repository.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn create_user(&self, new_user: &NewUser) -> RepoResult<()> {
        let user = &new_user.user;
        let result = self.conn.execute(
            "INSERT INTO users (uuid, username, email, password_hash, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                user.id.to_string(),
                user.username.as_str(),
                user.email.as_deref(),
                new_user.password_hash.as_str(),
                user.created_at,
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == ErrorCode::ConstraintViolation =>
            {
                Err(RepoError::Duplicate(user.username.clone()))
            }
            Err(err) => Err(err.into()),
        }
    }

    fn find_credentials(&self, username: &str) -> RepoResult<Option<UserCredentials>> {
        let row = self
            .conn
            .query_row(
                &format!("{USER_SELECT_SQL} WHERE users.username = ?1;"),
                [username],
                |row| Ok(read_credentials_row(row)),
            )
            .optional()?;
        row.transpose()
    }

    fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let row = self
            .conn
            .query_row(
                &format!(
                    "{USER_SELECT_SQL}
                     WHERE lower(users.email) = lower(?1)
                     ORDER BY users.created_at ASC
                     LIMIT 1;"
                ),
                [email],
                |row| Ok(read_credentials_row(row)),
            )
            .optional()?;
        Ok(row.transpose()?.map(|credentials| credentials.user))
    }

    fn insert_session(
        &self,
        token_digest: &str,
        user_id: UserId,
        created_at: i64,
    ) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO sessions (token_digest, user_uuid, created_at)
             VALUES (?1, ?2, ?3);",
            params![token_digest, user_id.to_string(), created_at],
        )?;
        Ok(())
    }

    fn find_session_user(&self, token_digest: &str) -> RepoResult<Option<User>> {
        let row = self
            .conn
            .query_row(
                &format!(
                    "{USER_SELECT_SQL}
                     INNER JOIN sessions ON sessions.user_uuid = users.uuid
                     WHERE sessions.token_digest = ?1;"
                ),
                [token_digest],
                |row| Ok(read_credentials_row(row)),
            )
            .optional()?;
        Ok(row.transpose()?.map(|credentials| credentials.user))
    }

    fn delete_session(&self, token_digest: &str) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM sessions WHERE token_digest = ?1;", [token_digest])?;
        Ok(changed > 0)
    }

    fn insert_reset_token(
        &self,
        token_digest: &str,
        user_id: UserId,
        expires_at: i64,
    ) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO password_reset_tokens (token_digest, user_uuid, expires_at, used)
             VALUES (?1, ?2, ?3, 0);",
            params![token_digest, user_id.to_string(), expires_at],
        )?;
        Ok(())
    }

    fn find_reset_token(&self, token_digest: &str) -> RepoResult<Option<ResetTokenRecord>> {
        let row = self
            .conn
            .query_row(
                "SELECT user_uuid, expires_at, used
                 FROM password_reset_tokens
                 WHERE token_digest = ?1;",
                [token_digest],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, i64>(2)?,
                    ))
                },
            )
            .optional()?;

        let Some((user_text, expires_at, used)) = row else {
            return Ok(None);
        };

        Ok(Some(ResetTokenRecord {
            user_id: parse_uuid(&user_text, "password_reset_tokens.user_uuid")?,
            expires_at,
            used: parse_bool(used, "password_reset_tokens.used")?,
        }))
    }

    fn complete_password_reset(
        &self,
        token_digest: &str,
        user_id: UserId,
        password_hash: &str,
    ) -> RepoResult<()> {
        let tx = self.conn.unchecked_transaction()?;

        let burned = tx.execute(
            "UPDATE password_reset_tokens
             SET used = ?1
             WHERE token_digest = ?2
               AND user_uuid = ?3
               AND used = 0;",
            params![bool_to_int(true), token_digest, user_id.to_string()],
        )?;
        if burned == 0 {
            return Err(RepoError::NotFound(user_id));
        }

        let changed = tx.execute(
            "UPDATE users SET password_hash = ?1 WHERE uuid = ?2;",
            params![password_hash, user_id.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(user_id));
        }

        tx.execute(
            "DELETE FROM sessions WHERE user_uuid = ?1;",
            [user_id.to_string()],
        )?;
        tx.commit()?;
        Ok(())
    }
}

fn read_credentials_row(row: &Row<'_>) -> RepoResult<UserCredentials> {
    let uuid_text: String = row.get("uuid")?;
    Ok(UserCredentials {
        user: User {
            id: parse_uuid(&uuid_text, "users.uuid")?,
            username: row.get("username")?,
            email: row.get("email")?,
            created_at: row.get("created_at")?,
        },
        password_hash: row.get("password_hash")?,
    })
}
