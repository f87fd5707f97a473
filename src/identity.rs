//! Local identity service.
//!
//! Accounts live in the `accounts` table, separate from the document store.
//! Email/password accounts store a random salt and the SHA-256 of
//! `salt || password`. Federated sign-ins are keyed by `(provider, subject)`
//! and link to an existing account with the same email.
//!
//! The signed-in user is published on a `watch` channel so callers can
//! react to sign-in and sign-out.

use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use tokio::sync::watch;
use uuid::Uuid;

use crate::error::{Error, Result};

const MIN_PASSWORD_LEN: usize = 6;

/// The signed-in user as reported by the identity service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub uid: String,
    pub email: String,
    pub display_name: String,
    pub photo_url: Option<String>,
}

/// An assertion from an external provider that has already been verified.
#[derive(Debug, Clone)]
pub struct FederatedCredential {
    pub provider: String,
    pub subject: String,
    pub email: String,
    pub display_name: String,
    pub photo_url: Option<String>,
}

#[derive(sqlx::FromRow)]
struct AccountRow {
    uid: String,
    email: String,
    display_name: String,
    photo_url: Option<String>,
    password_salt: Option<String>,
    password_hash: Option<String>,
}

impl From<AccountRow> for AuthUser {
    fn from(row: AccountRow) -> Self {
        AuthUser {
            uid: row.uid,
            email: row.email,
            display_name: row.display_name,
            photo_url: row.photo_url,
        }
    }
}

pub struct IdentityService {
    pool: SqlitePool,
    current: watch::Sender<Option<AuthUser>>,
}

impl IdentityService {
    pub fn new(pool: SqlitePool) -> Self {
        let (current, _) = watch::channel(None);
        Self { pool, current }
    }

    pub fn current_user(&self) -> Option<AuthUser> {
        self.current.borrow().clone()
    }

    /// Subscribes to sign-in/sign-out changes.
    pub fn subscribe(&self) -> watch::Receiver<Option<AuthUser>> {
        self.current.subscribe()
    }

    pub async fn sign_up(&self, email: &str, password: &str, display_name: &str) -> Result<AuthUser> {
        let email = normalize_email(email)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(Error::Invalid(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }
        if self.find_by_email(&email).await?.is_some() {
            return Err(Error::AccountExists(email));
        }

        let salt = generate_salt();
        let hash = hash_password(&salt, password);
        let display_name = match display_name.trim() {
            "" => default_display_name(&email),
            name => name.to_string(),
        };
        let user = AuthUser {
            uid: Uuid::new_v4().to_string(),
            email,
            display_name,
            photo_url: None,
        };

        sqlx::query(
            r#"
            INSERT INTO accounts (uid, email, display_name, photo_url, password_salt, password_hash, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.uid)
        .bind(&user.email)
        .bind(&user.display_name)
        .bind(&user.photo_url)
        .bind(&salt)
        .bind(&hash)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                Error::AccountExists(user.email.clone())
            }
            other => Error::Database(other),
        })?;

        tracing::info!("Created account {} for {}", user.uid, user.email);
        self.set_current(Some(user.clone()));
        Ok(user)
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser> {
        let email = normalize_email(email).map_err(|_| Error::InvalidCredentials)?;
        let row = self
            .find_by_email(&email)
            .await?
            .ok_or(Error::InvalidCredentials)?;

        match (&row.password_salt, &row.password_hash) {
            (Some(salt), Some(hash)) if hash_password(salt, password) == *hash => {}
            _ => return Err(Error::InvalidCredentials),
        }

        let user = AuthUser::from(row);
        self.set_current(Some(user.clone()));
        Ok(user)
    }

    /// Signs in with a verified provider assertion, creating or linking the account.
    pub async fn sign_in_with_provider(&self, credential: &FederatedCredential) -> Result<AuthUser> {
        let linked: Option<AccountRow> = sqlx::query_as(
            r#"
            SELECT a.uid, a.email, a.display_name, a.photo_url, a.password_salt, a.password_hash
            FROM accounts a
            JOIN federated_identities f ON f.uid = a.uid
            WHERE f.provider = ? AND f.subject = ?
            "#,
        )
        .bind(&credential.provider)
        .bind(&credential.subject)
        .fetch_optional(&self.pool)
        .await?;

        let user = match linked {
            Some(row) => AuthUser::from(row),
            None => self.link_provider(credential).await?,
        };

        self.set_current(Some(user.clone()));
        Ok(user)
    }

    async fn link_provider(&self, credential: &FederatedCredential) -> Result<AuthUser> {
        let email = normalize_email(&credential.email)?;
        let mut tx = self.pool.begin_with("BEGIN IMMEDIATE").await?;

        let existing: Option<AccountRow> = sqlx::query_as(
            "SELECT uid, email, display_name, photo_url, password_salt, password_hash FROM accounts WHERE email = ?",
        )
        .bind(&email)
        .fetch_optional(&mut *tx)
        .await?;

        let user = match existing {
            Some(row) => AuthUser::from(row),
            None => {
                let user = AuthUser {
                    uid: Uuid::new_v4().to_string(),
                    display_name: match credential.display_name.trim() {
                        "" => default_display_name(&email),
                        name => name.to_string(),
                    },
                    email,
                    photo_url: credential.photo_url.clone(),
                };
                sqlx::query(
                    "INSERT INTO accounts (uid, email, display_name, photo_url, created_at) VALUES (?, ?, ?, ?, ?)",
                )
                .bind(&user.uid)
                .bind(&user.email)
                .bind(&user.display_name)
                .bind(&user.photo_url)
                .bind(Utc::now().to_rfc3339())
                .execute(&mut *tx)
                .await?;
                user
            }
        };

        sqlx::query(
            "INSERT INTO federated_identities (provider, subject, uid, linked_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&credential.provider)
        .bind(&credential.subject)
        .bind(&user.uid)
        .bind(Utc::now().to_rfc3339())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::info!(
            "Linked {} identity {} to account {}",
            credential.provider,
            credential.subject,
            user.uid
        );
        Ok(user)
    }

    /// Restores a previously signed-in user by uid.
    pub async fn resume(&self, uid: &str) -> Result<AuthUser> {
        let row: Option<AccountRow> = sqlx::query_as(
            "SELECT uid, email, display_name, photo_url, password_salt, password_hash FROM accounts WHERE uid = ?",
        )
        .bind(uid)
        .fetch_optional(&self.pool)
        .await?;

        let user = AuthUser::from(row.ok_or(Error::NotSignedIn)?);
        self.set_current(Some(user.clone()));
        Ok(user)
    }

    pub fn sign_out(&self) {
        self.set_current(None);
    }

    /// Updates the account's photo URL shown on future sign-ins.
    pub async fn set_photo_url(&self, uid: &str, photo_url: &str) -> Result<()> {
        sqlx::query("UPDATE accounts SET photo_url = ? WHERE uid = ?")
            .bind(photo_url)
            .bind(uid)
            .execute(&self.pool)
            .await?;

        self.current.send_if_modified(|current| match current {
            Some(user) if user.uid == uid => {
                user.photo_url = Some(photo_url.to_string());
                true
            }
            _ => false,
        });
        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<AccountRow>> {
        Ok(sqlx::query_as(
            "SELECT uid, email, display_name, photo_url, password_salt, password_hash FROM accounts WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?)
    }

    fn set_current(&self, user: Option<AuthUser>) {
        self.current.send_replace(user);
    }
}

fn normalize_email(email: &str) -> Result<String> {
    let email = email.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
        _ => Err(Error::Invalid(format!("Invalid email address: {}", email))),
    }
}

fn default_display_name(email: &str) -> String {
    email.split('@').next().unwrap_or(email).to_string()
}

/// Returns 16 random bytes, hex encoded.
fn generate_salt() -> String {
    let mut bytes = [0u8; 16];
    rand::rng().fill(&mut bytes);
    to_hex(&bytes)
}

fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    to_hex(&hasher.finalize())
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
