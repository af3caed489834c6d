use crate::{
    db::DbPool,
    entities::session::{self, ActiveModel as SessionActiveModel, Entity as SessionEntity},
    entities::user::{self, ActiveModel as UserActiveModel, Entity as UserEntity},
    errors::ServiceError,
};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{Duration, Utc};
use rand::RngCore;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Session-based authentication over the `users` and `sessions` tables.
///
/// Passwords are stored as Argon2 hashes. Session cookies carry an opaque
/// random token; only its SHA-256 digest is persisted, so a leaked sessions
/// table cannot be replayed.
#[derive(Clone)]
pub struct AuthService {
    db_pool: Arc<DbPool>,
    session_ttl: Duration,
}

impl AuthService {
    pub fn new(db_pool: Arc<DbPool>, session_ttl_secs: u64) -> Self {
        Self {
            db_pool,
            session_ttl: Duration::seconds(session_ttl_secs as i64),
        }
    }

    /// Registers a new user and opens a session for them (auto-login).
    /// Returns the opaque session token to place in the cookie.
    #[instrument(skip(self, password, confirm))]
    pub async fn register(
        &self,
        username: &str,
        password: &str,
        confirm: &str,
    ) -> Result<String, ServiceError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(ServiceError::ValidationError(
                "Missing required field: username".to_string(),
            ));
        }
        if password.is_empty() {
            return Err(ServiceError::ValidationError(
                "Missing required field: password".to_string(),
            ));
        }
        if password != confirm {
            return Err(ServiceError::ValidationError(
                "passwords do not match".to_string(),
            ));
        }

        let db = &*self.db_pool;
        let existing = UserEntity::find()
            .filter(user::Column::Username.eq(username))
            .one(db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::ValidationError(format!(
                "Username {username} is already taken"
            )));
        }

        let user_id = Uuid::new_v4();
        let user_active_model = UserActiveModel {
            id: Set(user_id),
            username: Set(username.to_string()),
            password_hash: Set(hash_password(password)?),
            created_at: Set(Utc::now()),
        };
        user_active_model.insert(db).await?;

        info!(user_id = %user_id, "User registered");
        self.open_session(user_id).await
    }

    /// Verifies credentials and opens a session.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<String, ServiceError> {
        let db = &*self.db_pool;

        let user = UserEntity::find()
            .filter(user::Column::Username.eq(username.trim()))
            .one(db)
            .await?;

        let user = match user {
            Some(user) if verify_password(password, &user.password_hash) => user,
            _ => {
                warn!(username = %username, "Login failed");
                return Err(ServiceError::AuthError(
                    "Invalid username or password".to_string(),
                ));
            }
        };

        info!(user_id = %user.id, "User logged in");
        self.open_session(user.id).await
    }

    /// Revokes the session behind a cookie token. Unknown tokens are a no-op.
    #[instrument(skip(self, token))]
    pub async fn logout(&self, token: &str) -> Result<(), ServiceError> {
        let db = &*self.db_pool;
        SessionEntity::delete_many()
            .filter(session::Column::TokenHash.eq(hash_token(token)))
            .exec(db)
            .await?;
        Ok(())
    }

    /// Resolves a cookie token to its user, rejecting unknown and expired
    /// sessions. Expired rows are reaped on sight.
    #[instrument(skip(self, token))]
    pub async fn authenticate(&self, token: &str) -> Result<user::Model, ServiceError> {
        let db = &*self.db_pool;

        let session = SessionEntity::find()
            .filter(session::Column::TokenHash.eq(hash_token(token)))
            .one(db)
            .await?
            .ok_or(ServiceError::Unauthenticated)?;

        if session.expires_at <= Utc::now() {
            SessionEntity::delete_by_id(session.id).exec(db).await?;
            return Err(ServiceError::Unauthenticated);
        }

        UserEntity::find_by_id(session.user_id)
            .one(db)
            .await?
            .ok_or(ServiceError::Unauthenticated)
    }

    async fn open_session(&self, user_id: Uuid) -> Result<String, ServiceError> {
        let db = &*self.db_pool;
        let now = Utc::now();
        let token = generate_token();

        let session_active_model = SessionActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            token_hash: Set(hash_token(&token)),
            created_at: Set(now),
            expires_at: Set(now + self.session_ttl),
        };
        session_active_model.insert(db).await?;

        Ok(token)
    }
}

fn hash_password(password: &str) -> Result<String, ServiceError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ServiceError::InternalError(format!("password hashing failed: {e}")))
}

fn verify_password(password: &str, stored_hash: &str) -> bool {
    PasswordHash::new(stored_hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

fn hash_token(token: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(token.as_bytes()))
}
