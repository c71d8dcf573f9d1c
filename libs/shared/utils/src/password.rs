use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};
use tracing::instrument;

/// Well-formed Argon2id hash at the default time cost that matches no password.
/// Only used when [`dummy_password_hash`] cannot build one for the configured cost.
pub const DUMMY_PASSWORD_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHRzb21lc2FsdA$AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("Password hashing failed")]
    HashingFailed,

    #[error("Invalid password hash format")]
    InvalidHashFormat,
}

fn hasher(cost: u32) -> Result<Argon2<'static>, PasswordError> {
    let params = Params::new(Params::DEFAULT_M_COST, cost, Params::DEFAULT_P_COST, None)
        .map_err(|_| PasswordError::HashingFailed)?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Hashes with a fresh salt. `cost` is the Argon2 time cost.
#[instrument(skip(password))]
pub fn hash_password(password: &str, cost: u32) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = hasher(cost)?
        .hash_password(password.as_bytes(), &salt)
        .map_err(|_| PasswordError::HashingFailed)?;

    Ok(hash.to_string())
}

/// A hash of a random secret made with the same parameters as real hashes.
/// Compared against when an account does not exist, so lookup misses cost
/// the same as wrong passwords.
pub fn dummy_password_hash(cost: u32) -> Result<String, PasswordError> {
    let secret = SaltString::generate(&mut OsRng);
    hash_password(secret.as_str(), cost)
}

/// Constant-time comparison against a stored PHC string. The parameters are
/// read from the hash itself, so hashes made with an older cost still verify.
#[instrument(skip(password, hash))]
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| PasswordError::InvalidHashFormat)?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(_) => Err(PasswordError::InvalidHashFormat),
    }
}

pub fn validate_password_strength(password: &str) -> Result<(), &'static str> {
    if password.chars().count() < 8 {
        return Err("Password must be at least 8 characters long");
    }

    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err("Password must contain at least one number");
    }

    if !password.chars().any(|c| c.is_alphabetic()) {
        return Err("Password must contain at least one letter");
    }

    Ok(())
}
