use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use std::fmt;

/// Plaintext password. `Debug` is redacted so it cannot end up in logs or
/// tracing fields.
#[derive(Clone)]
pub struct Password(String);

impl Password {
    pub fn new(password: impl Into<String>) -> Self {
        Self(password.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(***)")
    }
}

/// Argon2 PHC string as stored in `users.password_hash`.
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

/// Hash a password with Argon2id and a fresh random salt.
pub fn hash_password(password: &Password) -> Result<PasswordHashString, anyhow::Error> {
    let salt = SaltString::generate(&mut OsRng);

    let password_hash = Argon2::default()
        .hash_password(password.as_str().as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?
        .to_string();

    Ok(PasswordHashString::new(password_hash))
}

/// Constant-time check of `password` against a stored hash.
///
/// `Ok(false)` is a mismatch; `Err` means the stored hash is unreadable.
pub fn verify_password(
    password: &Password,
    password_hash: &PasswordHashString,
) -> Result<bool, anyhow::Error> {
    let parsed_hash = PasswordHash::new(password_hash.as_str())
        .map_err(|e| anyhow::anyhow!("Invalid password hash format: {}", e))?;

    match Argon2::default().verify_password(password.as_str().as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(anyhow::anyhow!("Password verification failed: {}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_argon2id() {
        let hash = hash_password(&Password::new("correct-horse")).expect("Failed to hash password");
        assert!(hash.as_str().starts_with("$argon2id$"));
    }

    #[test]
    fn test_verify() {
        let password = Password::new("correct-horse");
        let hash = hash_password(&password).expect("Failed to hash password");

        assert!(verify_password(&password, &hash).unwrap());
        assert!(!verify_password(&Password::new("battery-staple"), &hash).unwrap());
    }

    #[test]
    fn test_salted() {
        let password = Password::new("correct-horse");
        let hash1 = hash_password(&password).unwrap();
        let hash2 = hash_password(&password).unwrap();
        assert_ne!(hash1.as_str(), hash2.as_str());
    }

    #[test]
    fn test_malformed_hash_is_error() {
        let result = verify_password(
            &Password::new("correct-horse"),
            &PasswordHashString::new("plaintext".to_string()),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_debug_redacts() {
        let rendered = format!("{:?}", Password::new("correct-horse"));
        assert!(!rendered.contains("correct-horse"));
    }
}
