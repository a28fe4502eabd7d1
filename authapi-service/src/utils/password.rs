use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use secrecy::{ExposeSecret, SecretString};

/// Plaintext password; `Debug` prints `[REDACTED]`.
#[derive(Debug, Clone)]
pub struct Password(SecretString);

impl Password {
    pub fn new(password: String) -> Self {
        Self(SecretString::new(password))
    }

    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl From<SecretString> for Password {
    fn from(secret: SecretString) -> Self {
        Self(secret)
    }
}

/// Newtype for an argon2 PHC string
#[derive(Debug, Clone)]
pub struct PasswordHashString(String);

impl PasswordHashString {
    pub fn new(hash: String) -> Self {
        Self(hash)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// Hash a password using Argon2id with default parameters.
///
/// Salt is generated per call and embedded in the PHC string.
pub fn hash_password(password: &Password) -> Result<PasswordHashString, anyhow::Error> {
    let argon2 = Argon2::default();
    let salt = SaltString::generate(&mut OsRng);

    let password_hash = argon2
        .hash_password(password.expose().as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?
        .to_string();

    Ok(PasswordHashString::new(password_hash))
}

/// Constant-time verification against a stored PHC string.
pub fn verify_password(
    password: &Password,
    password_hash: &PasswordHashString,
) -> Result<(), anyhow::Error> {
    let parsed_hash = PasswordHash::new(password_hash.as_str())
        .map_err(|e| anyhow::anyhow!("Invalid password hash format: {}", e))?;

    Argon2::default()
        .verify_password(password.expose().as_bytes(), &parsed_hash)
        .map_err(|_| anyhow::anyhow!("Password verification failed"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_password() {
        let password = Password::new("correct horse battery".to_string());
        let hash = hash_password(&password).expect("Failed to hash password");

        assert!(hash.as_str().starts_with("$argon2"));
    }

    #[test]
    fn test_verify_password_correct() {
        let password = Password::new("correct horse battery".to_string());
        let hash = hash_password(&password).expect("Failed to hash password");

        assert!(verify_password(&password, &hash).is_ok());
    }

    #[test]
    fn test_verify_password_incorrect() {
        let password = Password::new("correct horse battery".to_string());
        let hash = hash_password(&password).expect("Failed to hash password");

        let wrong_password = Password::new("wrong".to_string());
        assert!(verify_password(&wrong_password, &hash).is_err());
    }

    #[test]
    fn test_different_hashes_for_same_password() {
        let password = Password::new("correct horse battery".to_string());
        let hash1 = hash_password(&password).expect("Failed to hash password");
        let hash2 = hash_password(&password).expect("Failed to hash password");

        // random salt
        assert_ne!(hash1.as_str(), hash2.as_str());
        assert!(verify_password(&password, &hash1).is_ok());
        assert!(verify_password(&password, &hash2).is_ok());
    }

    #[test]
    fn garbage_hash_is_rejected() {
        let password = Password::new("anything".to_string());
        let hash = PasswordHashString::new("not-a-phc-string".to_string());
        assert!(verify_password(&password, &hash).is_err());
    }

    #[test]
    fn debug_output_redacts_the_password() {
        let password = Password::new("hunter2".to_string());
        assert!(!format!("{:?}", password).contains("hunter2"));
    }
}
