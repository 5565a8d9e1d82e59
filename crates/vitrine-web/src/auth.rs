//! Admin password hashing.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use rand_core::OsRng;

use crate::error::Error;

/// Hash `password` into an argon2 PHC string, e.g. `$argon2id$v=19$…`.
pub fn hash_password(password: &str) -> Result<String, Error> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|hash| hash.to_string())
    .map_err(|e| Error::Password(e.to_string()))
}

/// `false` for a wrong password and for a malformed stored hash alike.
pub fn verify_password(password: &str, password_hash: &str) -> bool {
  let Ok(parsed) = PasswordHash::new(password_hash) else {
    tracing::warn!("stored admin password hash is not a valid PHC string");
    return false;
  };
  Argon2::default()
    .verify_password(password.as_bytes(), &parsed)
    .is_ok()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn correct_password_verifies() {
    let hash = hash_password("admin123").unwrap();
    assert!(hash.starts_with("$argon2"));
    assert!(verify_password("admin123", &hash));
  }

  #[test]
  fn wrong_password_is_rejected() {
    let hash = hash_password("admin123").unwrap();
    assert!(!verify_password("admin124", &hash));
    assert!(!verify_password("", &hash));
  }

  #[test]
  fn salts_differ_between_hashes() {
    assert_ne!(hash_password("same").unwrap(), hash_password("same").unwrap());
  }

  #[test]
  fn malformed_hash_never_verifies() {
    assert!(!verify_password("admin123", "pbkdf2:sha256:600000$abc$def"));
  }
}
