//! Identity use-case service: registration, sessions and password reset.
//!
//! # Responsibility
//! - Turn credentials or session tokens into an authenticated `Owner`.
//! - Run the token-based password reset flow.
//!
//! # Invariants
//! - Passwords are stored as Argon2id PHC strings only.
//! - Raw session/reset tokens leave this service exactly once (to the caller
//!   or the mailer); storage sees SHA-256 digests.
//! - Unknown usernames and wrong passwords produce the same error.
//! - A reset request never reveals whether the email matched an account.

use crate::model::user::{Owner, User};
use crate::repo::user_repo::{NewUser, UserRepository};
use crate::repo::RepoError;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use chrono::{Duration, Utc};
use log::{info, warn};
use once_cell::sync::Lazy;
use rand::RngCore;
use regex::Regex;
use sha2::{Digest, Sha256};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Letters, digits and `@ . + - _`.
static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\w.@+-]+$").expect("valid username regex"));

const USERNAME_MAX_CHARS: usize = 150;
const TOKEN_BYTES: usize = 32;
/// Default lifetime of a password reset token.
pub const DEFAULT_RESET_TOKEN_TTL_MINUTES: i64 = 60;
/// Longest accepted reset token lifetime (30 days).
pub const MAX_RESET_TOKEN_TTL_MINUTES: i64 = 30 * 24 * 60;

/// Identity failure.
#[derive(Debug)]
pub enum IdentityError {
    EmptyUsername,
    InvalidUsername(String),
    EmptyPassword,
    PasswordMismatch,
    EmptyEmail,
    DuplicateUsername(String),
    InvalidCredentials,
    InvalidResetToken,
    /// The configured token lifetime pushes the expiry past the clock range.
    ResetTokenExpiryOutOfRange,
    PasswordHash(String),
    Mailer(String),
    Repo(RepoError),
}

impl IdentityError {
    /// Whether the error stems from malformed caller input.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::EmptyUsername
                | Self::InvalidUsername(_)
                | Self::EmptyPassword
                | Self::PasswordMismatch
                | Self::EmptyEmail
        )
    }
}

impl Display for IdentityError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyUsername => write!(f, "username must not be empty"),
            Self::InvalidUsername(value) => write!(
                f,
                "invalid username `{value}`; use at most {USERNAME_MAX_CHARS} letters, digits and @/./+/-/_"
            ),
            Self::EmptyPassword => write!(f, "password must not be empty"),
            Self::PasswordMismatch => write!(f, "passwords do not match"),
            Self::EmptyEmail => write!(f, "email must not be empty"),
            Self::DuplicateUsername(value) => write!(f, "username already exists: {value}"),
            Self::InvalidCredentials => write!(f, "invalid credentials"),
            Self::InvalidResetToken => write!(f, "password reset token is invalid or expired"),
            Self::ResetTokenExpiryOutOfRange => {
                write!(f, "password reset token lifetime is out of range")
            }
            Self::PasswordHash(message) => write!(f, "password hashing failed: {message}"),
            Self::Mailer(message) => write!(f, "reset mail delivery failed: {message}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for IdentityError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for IdentityError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Duplicate(username) => Self::DuplicateUsername(username),
            other => Self::Repo(other),
        }
    }
}

pub type IdentityResult<T> = Result<T, IdentityError>;

/// Delivery channel for password reset tokens.
pub trait ResetMailer {
    /// Sends `token` to `recipient`. Errors are returned as diagnostic text.
    fn send_reset_token(&self, recipient: &str, username: &str, token: &str)
        -> Result<(), String>;
}

/// Input for account registration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisterRequest {
    pub username: String,
    pub email: Option<String>,
    pub password: String,
    pub confirm_password: String,
}

/// Result of a successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionGrant {
    /// Opaque bearer token for later `resume`/`logout` calls.
    pub token: String,
    pub owner: Owner,
}

/// Use-case service for the identity store.
pub struct IdentityService<R: UserRepository> {
    repo: R,
    hasher: Argon2<'static>,
    reset_token_ttl: Duration,
}

impl<R: UserRepository> IdentityService<R> {
    /// Creates a service with default Argon2id cost and reset token lifetime.
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            hasher: Argon2::default(),
            reset_token_ttl: Duration::minutes(DEFAULT_RESET_TOKEN_TTL_MINUTES),
        }
    }

    /// Overrides Argon2id memory (KiB) and iteration cost.
    pub fn with_hash_cost(mut self, memory_kib: u32, iterations: u32) -> IdentityResult<Self> {
        let params = Params::new(memory_kib, iterations, 1, None)
            .map_err(|err| IdentityError::PasswordHash(format!("argon2 params: {err}")))?;
        self.hasher = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
        Ok(self)
    }

    /// Overrides how long reset tokens stay valid.
    pub fn with_reset_token_ttl(mut self, ttl: Duration) -> Self {
        self.reset_token_ttl = ttl;
        self
    }

    /// Registers a new account.
    ///
    /// # Errors
    /// - Validation variants for blank/malformed username, blank password or
    ///   mismatched confirmation.
    /// - `DuplicateUsername` when the username is taken.
    pub fn register(&self, request: &RegisterRequest) -> IdentityResult<User> {
        let username = normalize_username(&request.username)?;
        validate_new_password(&request.password, &request.confirm_password)?;

        if self.repo.find_credentials(&username)?.is_some() {
            return Err(IdentityError::DuplicateUsername(username));
        }

        let user = User {
            id: Uuid::new_v4(),
            username,
            email: request
                .email
                .as_deref()
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string),
            created_at: Utc::now().timestamp_millis(),
        };
        let password_hash = self.hash_password(&request.password)?;

        self.repo.create_user(&NewUser {
            user: user.clone(),
            password_hash,
        })?;
        info!("event=user_register module=identity status=ok user_id={}", user.id);
        Ok(user)
    }

    /// Checks credentials and returns the owner context.
    pub fn authenticate(&self, username: &str, password: &str) -> IdentityResult<Owner> {
        let Some(credentials) = self.repo.find_credentials(username.trim())? else {
            warn!("event=user_authenticate module=identity status=error error_code=invalid_credentials");
            return Err(IdentityError::InvalidCredentials);
        };

        if !self.verify_password(password, &credentials.password_hash)? {
            warn!(
                "event=user_authenticate module=identity status=error error_code=invalid_credentials user_id={}",
                credentials.user.id
            );
            return Err(IdentityError::InvalidCredentials);
        }

        Ok(Owner::authenticated(&credentials.user))
    }

    /// Authenticates and establishes a session.
    pub fn login(&self, username: &str, password: &str) -> IdentityResult<SessionGrant> {
        let owner = self.authenticate(username, password)?;
        let token = generate_token();
        self.repo.insert_session(
            &token_digest(&token),
            owner.user_id(),
            Utc::now().timestamp_millis(),
        )?;
        info!(
            "event=session_open module=identity status=ok user_id={}",
            owner.user_id()
        );
        Ok(SessionGrant { token, owner })
    }

    /// Resolves a session token to its owner.
    pub fn resume(&self, token: &str) -> IdentityResult<Owner> {
        let token = token.trim();
        if token.is_empty() {
            return Err(IdentityError::InvalidCredentials);
        }
        self.repo
            .find_session_user(&token_digest(token))?
            .map(|user| Owner::authenticated(&user))
            .ok_or(IdentityError::InvalidCredentials)
    }

    /// Destroys a session. Unknown tokens are ignored.
    pub fn logout(&self, token: &str) -> IdentityResult<()> {
        let removed = self.repo.delete_session(&token_digest(token.trim()))?;
        info!("event=session_close module=identity status=ok removed={removed}");
        Ok(())
    }

    /// Issues a reset token for the account with `email`, if any, and hands
    /// it to `mailer`.
    pub fn request_password_reset(
        &self,
        email: &str,
        mailer: &dyn ResetMailer,
    ) -> IdentityResult<()> {
        let email = email.trim();
        if email.is_empty() {
            return Err(IdentityError::EmptyEmail);
        }

        let Some(user) = self.repo.find_user_by_email(email)? else {
            info!("event=password_reset_request module=identity status=ok matched=false");
            return Ok(());
        };

        let token = generate_token();
        let expires_at = Utc::now()
            .checked_add_signed(self.reset_token_ttl)
            .ok_or(IdentityError::ResetTokenExpiryOutOfRange)?
            .timestamp_millis();
        self.repo
            .insert_reset_token(&token_digest(&token), user.id, expires_at)?;
        mailer
            .send_reset_token(email, &user.username, &token)
            .map_err(IdentityError::Mailer)?;

        info!(
            "event=password_reset_request module=identity status=ok matched=true user_id={}",
            user.id
        );
        Ok(())
    }

    /// Sets a new password using a reset token. The token is single-use and
    /// every existing session of the user is closed.
    pub fn confirm_password_reset(
        &self,
        token: &str,
        new_password: &str,
        confirm_password: &str,
    ) -> IdentityResult<()> {
        validate_new_password(new_password, confirm_password)?;

        let digest = token_digest(token.trim());
        let record = self
            .repo
            .find_reset_token(&digest)?
            .ok_or(IdentityError::InvalidResetToken)?;
        if record.used || record.expires_at <= Utc::now().timestamp_millis() {
            warn!(
                "event=password_reset_confirm module=identity status=error error_code=invalid_token used={}",
                record.used
            );
            return Err(IdentityError::InvalidResetToken);
        }

        let password_hash = self.hash_password(new_password)?;
        match self
            .repo
            .complete_password_reset(&digest, record.user_id, &password_hash)
        {
            Ok(()) => {}
            Err(RepoError::NotFound(_)) => return Err(IdentityError::InvalidResetToken),
            Err(err) => return Err(err.into()),
        }

        info!(
            "event=password_reset_confirm module=identity status=ok user_id={}",
            record.user_id
        );
        Ok(())
    }

    fn hash_password(&self, password: &str) -> IdentityResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        self.hasher
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|err| IdentityError::PasswordHash(err.to_string()))
    }

    fn verify_password(&self, password: &str, stored_hash: &str) -> IdentityResult<bool> {
        let parsed = PasswordHash::new(stored_hash).map_err(|err| {
            IdentityError::Repo(RepoError::InvalidData(format!(
                "invalid password hash in users.password_hash: {err}"
            )))
        })?;
        Ok(self
            .hasher
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }
}

fn normalize_username(value: &str) -> IdentityResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(IdentityError::EmptyUsername);
    }
    if trimmed.chars().count() > USERNAME_MAX_CHARS || !USERNAME_RE.is_match(trimmed) {
        return Err(IdentityError::InvalidUsername(trimmed.to_string()));
    }
    Ok(trimmed.to_string())
}

fn validate_new_password(password: &str, confirm_password: &str) -> IdentityResult<()> {
    if password.is_empty() {
        return Err(IdentityError::EmptyPassword);
    }
    if password != confirm_password {
        return Err(IdentityError::PasswordMismatch);
    }
    Ok(())
}

fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn token_digest(token: &str) -> String {
    format!("{:x}", Sha256::digest(token.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::{
        generate_token, normalize_username, token_digest, validate_new_password, IdentityError,
    };

    #[test]
    fn normalize_username_trims_and_checks_charset() {
        assert_eq!(normalize_username("  ada.l@home ").expect("valid username"), "ada.l@home");
        assert!(matches!(
            normalize_username("   "),
            Err(IdentityError::EmptyUsername)
        ));
        assert!(matches!(
            normalize_username("has space"),
            Err(IdentityError::InvalidUsername(_))
        ));
        assert!(matches!(
            normalize_username(&"a".repeat(151)),
            Err(IdentityError::InvalidUsername(_))
        ));
    }

    #[test]
    fn validate_new_password_requires_matching_confirmation() {
        assert!(validate_new_password("secret", "secret").is_ok());
        assert!(matches!(
            validate_new_password("", ""),
            Err(IdentityError::EmptyPassword)
        ));
        assert!(matches!(
            validate_new_password("secret", "Secret"),
            Err(IdentityError::PasswordMismatch)
        ));
    }

    #[test]
    fn tokens_are_random_hex_and_digests_are_stable() {
        let first = generate_token();
        let second = generate_token();
        assert_eq!(first.len(), 64);
        assert_ne!(first, second);
        assert_eq!(token_digest(&first), token_digest(&first));
        assert_ne!(token_digest(&first), first);
    }
}
