#![allow(dead_code)]

use rusqlite::Connection;
use taskdesk_core::{IdentityService, Owner, RegisterRequest, SqliteUserRepository};

pub const PASSWORD: &str = "correct horse";

/// Identity service with a cheap Argon2 cost so tests stay fast.
pub fn identity_service(conn: &Connection) -> IdentityService<SqliteUserRepository<'_>> {
    let repo = SqliteUserRepository::try_new(conn).unwrap();
    IdentityService::new(repo).with_hash_cost(1024, 1).unwrap()
}

pub fn register_request(username: &str, email: Option<&str>) -> RegisterRequest {
    RegisterRequest {
        username: username.to_string(),
        email: email.map(str::to_string),
        password: PASSWORD.to_string(),
        confirm_password: PASSWORD.to_string(),
    }
}

/// Registers `username` and returns its authenticated owner context.
pub fn register_owner(conn: &Connection, username: &str) -> Owner {
    let identity = identity_service(conn);
    identity
        .register(&register_request(username, None))
        .unwrap();
    identity.authenticate(username, PASSWORD).unwrap()
}
