use argon2::password_hash::{SaltString, rand_core};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash};

use crate::services::User;

/// Password hashing for the seeded accounts.
#[derive(Clone, Default)]
pub struct AuthService {
    argon2: Argon2<'static>,
}

impl AuthService {
    pub fn new() -> Self {
        Self::default()
    }

    /// PHC string with a fresh random salt.
    pub fn hash(&self, password: &str) -> Result<String, password_hash::Error> {
        let salt = SaltString::generate(&mut rand_core::OsRng);

        Ok(self
            .argon2
            .hash_password(password.as_bytes(), &salt)?
            .to_string())
    }

    /// `Ok(false)` for a wrong password, `Err` only for a corrupt stored hash.
    pub fn verify(&self, password_hash: &str, password: &str) -> Result<bool, password_hash::Error> {
        let stored = PasswordHash::new(password_hash)?;

        match self.argon2.verify_password(password.as_bytes(), &stored) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub fn verify_user(&self, user: &User, password: &str) -> Result<bool, password_hash::Error> {
        self.verify(&user.password_hash, password)
    }
}
