//! Password hashing and verification

use crate::{AuthError, AuthResult, PasswordConfig, PasswordHasher};
use subtle::ConstantTimeEq;

#[cfg(any(feature = "argon2", feature = "bcrypt"))]
use crate::traits::DUMMY_SECRET;
#[cfg(any(feature = "argon2", feature = "bcrypt"))]
use std::sync::OnceLock;

#[cfg(feature = "argon2")]
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Argon2,
};

#[cfg(feature = "bcrypt")]
use bcrypt::{hash, verify, DEFAULT_COST};

/// Argon2id password hasher
#[cfg(feature = "argon2")]
#[derive(Debug, Clone)]
pub struct Argon2Hasher {
    memory_cost: u32,
    time_cost: u32,
    parallelism: u32,
    dummy: OnceLock<String>,
}

#[cfg(feature = "argon2")]
impl Argon2Hasher {
    /// Create a new Argon2 hasher with custom parameters
    pub fn new(memory_cost: u32, time_cost: u32, parallelism: u32) -> Self {
        Self {
            memory_cost,
            time_cost,
            parallelism,
            dummy: OnceLock::new(),
        }
    }

    /// Create an Argon2 hasher optimized for development (faster)
    pub fn development() -> Self {
        Self {
            memory_cost: 4096, // 4 MB
            time_cost: 2,
            parallelism: 2,
            dummy: OnceLock::new(),
        }
    }

    fn argon2(&self) -> AuthResult<Argon2<'static>> {
        let params = argon2::Params::new(self.memory_cost, self.time_cost, self.parallelism, None)
            .map_err(|e| AuthError::crypto_error(e.to_string()))?;
        Ok(Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params))
    }
}

#[cfg(feature = "argon2")]
impl Default for Argon2Hasher {
    fn default() -> Self {
        Self {
            memory_cost: 65536, // 64 MB
            time_cost: 3,
            parallelism: 4,
            dummy: OnceLock::new(),
        }
    }
}

#[cfg(feature = "argon2")]
impl PasswordHasher for Argon2Hasher {
    fn hash_password(&self, password: &str) -> AuthResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let password_hash = self.argon2()?.hash_password(password.as_bytes(), &salt)?;
        Ok(password_hash.to_string())
    }

    fn verify_password(&self, password: &str, hash: &str) -> AuthResult<bool> {
        let parsed_hash = PasswordHash::new(hash)?;

        // Parameters embedded in the stored hash win over ours
        match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn hasher_name(&self) -> &str {
        "argon2"
    }

    fn dummy_hash(&self) -> AuthResult<String> {
        cached_dummy_hash(&self.dummy, self)
    }
}

/// bcrypt password hasher
#[cfg(feature = "bcrypt")]
#[derive(Debug, Clone)]
pub struct BcryptHasher {
    cost: u32,
    dummy: OnceLock<String>,
}

#[cfg(feature = "bcrypt")]
impl BcryptHasher {
    /// Create a new bcrypt hasher with custom cost
    pub fn new(cost: u32) -> Self {
        Self {
            cost,
            dummy: OnceLock::new(),
        }
    }

    /// Create a bcrypt hasher optimized for development (faster)
    pub fn development() -> Self {
        Self::new(4)
    }
}

#[cfg(feature = "bcrypt")]
impl Default for BcryptHasher {
    fn default() -> Self {
        Self::new(DEFAULT_COST)
    }
}

#[cfg(feature = "bcrypt")]
impl PasswordHasher for BcryptHasher {
    fn hash_password(&self, password: &str) -> AuthResult<String> {
        hash(password, self.cost).map_err(AuthError::from)
    }

    fn verify_password(&self, password: &str, hash: &str) -> AuthResult<bool> {
        verify(password, hash).map_err(AuthError::from)
    }

    fn hasher_name(&self) -> &str {
        "bcrypt"
    }

    fn dummy_hash(&self) -> AuthResult<String> {
        cached_dummy_hash(&self.dummy, self)
    }
}

/// Hash [`DUMMY_SECRET`] once per hasher and reuse it
#[cfg(any(feature = "argon2", feature = "bcrypt"))]
fn cached_dummy_hash(cell: &OnceLock<String>, hasher: &dyn PasswordHasher) -> AuthResult<String> {
    if let Some(hash) = cell.get() {
        return Ok(hash.clone());
    }
    let hash = hasher.hash_password(DUMMY_SECRET)?;
    Ok(cell.get_or_init(|| hash).clone())
}

/// Stores credentials as given and compares them in constant time.
///
/// Only for development directories seeded with literal secrets.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaintextHasher;

impl PasswordHasher for PlaintextHasher {
    fn hash_password(&self, password: &str) -> AuthResult<String> {
        Ok(password.to_string())
    }

    fn verify_password(&self, password: &str, hash: &str) -> AuthResult<bool> {
        Ok(password.as_bytes().ct_eq(hash.as_bytes()).into())
    }

    fn hasher_name(&self) -> &str {
        "plaintext"
    }
}

/// Password hasher factory for creating different hashers
pub struct PasswordHasherFactory;

impl PasswordHasherFactory {
    /// Create the hasher named by the configuration
    pub fn from_config(config: &PasswordConfig) -> AuthResult<Box<dyn PasswordHasher>> {
        match config.hash_algorithm.as_str() {
            #[cfg(feature = "argon2")]
            "argon2" => Ok(Box::new(Argon2Hasher::new(
                config.argon2_memory,
                config.argon2_iterations,
                config.argon2_parallelism,
            ))),
            #[cfg(feature = "bcrypt")]
            "bcrypt" => Ok(Box::new(BcryptHasher::new(config.bcrypt_cost))),
            "plaintext" => Ok(Box::new(PlaintextHasher)),
            other => Err(AuthError::config_error(format!(
                "Unknown password hashing algorithm: {} (or feature not enabled)",
                other
            ))),
        }
    }
}
