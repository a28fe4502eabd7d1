//! Credential checks and token lifecycle.

use std::sync::Arc;

use secrecy::SecretString;
use service_core::error::AppError;

use super::error::AuthError;
use super::store::Store;
use super::visibility::user_visible;
use crate::models::{NewUser, Token, User};
use crate::utils::{hash_password, verify_password, Password, PasswordHashString};

/// Raw key handed to the client exactly once; only its hash is stored.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub key: String,
    pub token: Token,
}

/// Emails are matched case-insensitively by storing them lowercased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn Store>,
}

impl AuthService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Verifies the password and replaces any token the user already holds.
    ///
    /// Unknown email and wrong password are indistinguishable to the caller.
    pub async fn issue_token(
        &self,
        email: &str,
        password: &Password,
    ) -> Result<IssuedToken, AuthError> {
        let email = normalize_email(email);
        let Some(user) = self.store.find_user_by_email(&email).await? else {
            tracing::warn!("Token request for unknown email");
            return Err(AuthError::InvalidCredentials);
        };

        let stored = PasswordHashString::new(user.password_hash.clone());
        if verify_password(password, &stored).is_err() {
            tracing::warn!(user_id = user.id, "Token request with wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        if !user.is_active {
            tracing::warn!(user_id = user.id, "Token request for inactive user");
            return Err(AuthError::UserInactive);
        }

        let key = Token::generate_key();
        let token = self
            .store
            .replace_user_token(user.id, &Token::hash_key(&key))
            .await?;

        tracing::info!(user_id = user.id, token_id = token.id, "Token issued");
        Ok(IssuedToken { key, token })
    }

    /// The active user holding `key`, if any.
    pub async fn resolve_user(&self, key: &str) -> Result<Option<User>, AppError> {
        let Some(token) = self.store.find_token_by_hash(&Token::hash_key(key)).await? else {
            return Ok(None);
        };
        let user = self.store.find_user_by_id(token.user_id).await?;
        Ok(user.filter(user_visible))
    }

    pub async fn create_user(
        &self,
        email: &str,
        password: &Password,
        is_admin: bool,
    ) -> Result<User, AuthError> {
        let password_hash = hash_password(password)?;
        let mut new_user = NewUser::new(normalize_email(email), password_hash.into_string());
        new_user.is_admin = is_admin;

        let user = self.store.insert_user(new_user).await?;
        tracing::info!(user_id = user.id, is_admin, "User created");
        Ok(user)
    }

    /// Creates the configured admin unless the email is already registered.
    /// Returns whether a user was created.
    pub async fn ensure_admin(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<bool, AuthError> {
        if self
            .store
            .find_user_by_email(&normalize_email(email))
            .await?
            .is_some()
        {
            tracing::info!("Bootstrap admin already present");
            return Ok(false);
        }
        self.create_user(email, &Password::from(password.clone()), true)
            .await?;
        Ok(true)
    }
}
