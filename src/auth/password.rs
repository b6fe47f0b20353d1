//! Password hashing and verification on top of argon2 PHC strings.

use anyhow::{Result, anyhow};
use argon2::password_hash::rand_core::OsRng;
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};

/// PHC hash of a throwaway password, verified on the unknown-identity login
/// path so that path costs roughly the same as a real mismatch.
const DUMMY_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$wkoFXEhT8OGMlUPNluUimw$JwtUGnEMvNg+8M84dqvBQIT9eYxXRdpnMIjYw8HDTRM";

/// Hash a plaintext secret with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow!("Failed to hash password: {e}"))?
        .to_string();
    Ok(hash)
}

/// Compare a plaintext secret against a stored PHC hash.
///
/// An unparseable hash verifies as false rather than erroring, so a corrupt
/// row degrades to an ordinary authentication failure.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Burn a verification against a fixed hash. Called when the identity does
/// not exist, so unknown-email and wrong-password logins do comparable work.
pub fn verify_dummy(password: &str) {
    let _ = verify_password(password, DUMMY_HASH);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let hash = hash_password("Str0ng!pw").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("Str0ng!pw", &hash));
        assert!(!verify_password("wrong", &hash));
    }

    #[test]
    fn salts_differ_between_hashes() {
        let a = hash_password("same-password").unwrap();
        let b = hash_password("same-password").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn garbage_hash_verifies_false() {
        assert!(!verify_password("anything", "not-a-phc-string"));
        assert!(!verify_password("anything", ""));
    }
}
