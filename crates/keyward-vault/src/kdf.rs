// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Argon2id key derivation from the master password.
//!
//! Derives a 32-byte wrapping key using Argon2id (v0x13). The parameters are
//! stored in each container header, so a keyring keeps opening with the cost
//! it was created with even after the configured defaults change.

use keyward_config::model::{
    KDF_MAX_ITERATIONS, KDF_MAX_MEMORY_COST, KDF_MAX_PARALLELISM, VaultConfig,
};
use keyward_core::KeywardError;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::crypto::{self, KEY_LEN};

pub const SALT_LEN: usize = 16;

/// Argon2id cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    /// Memory cost in KiB.
    pub memory_cost: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl From<&VaultConfig> for KdfParams {
    fn from(config: &VaultConfig) -> Self {
        Self {
            memory_cost: config.kdf_memory_cost,
            iterations: config.kdf_iterations,
            parallelism: config.kdf_parallelism,
        }
    }
}

impl KdfParams {
    /// Reject parameters outside the accepted range before any memory is
    /// committed to a derivation.
    pub fn check_limits(&self) -> Result<(), KeywardError> {
        let within = self.memory_cost <= KDF_MAX_MEMORY_COST
            && (1..=KDF_MAX_ITERATIONS).contains(&self.iterations)
            && (1..=KDF_MAX_PARALLELISM).contains(&self.parallelism);
        if within {
            Ok(())
        } else {
            Err(KeywardError::Keyring(format!(
                "Argon2id parameters out of range: memory_cost={}, iterations={}, parallelism={}",
                self.memory_cost, self.iterations, self.parallelism
            )))
        }
    }
}

impl Default for KdfParams {
    fn default() -> Self {
        Self::from(&VaultConfig::default())
    }
}

/// Derive a 32-byte key from `password` using Argon2id.
pub fn derive_key(
    password: &[u8],
    salt: &[u8; SALT_LEN],
    params: &KdfParams,
) -> Result<Zeroizing<[u8; KEY_LEN]>, KeywardError> {
    let argon_params = argon2::Params::new(
        params.memory_cost,
        params.iterations,
        params.parallelism,
        Some(KEY_LEN),
    )
    .map_err(|e| KeywardError::Keyring(format!("invalid Argon2id parameters: {e}")))?;

    let argon2 = argon2::Argon2::new(
        argon2::Algorithm::Argon2id,
        argon2::Version::V0x13,
        argon_params,
    );

    let mut output = Zeroizing::new([0u8; KEY_LEN]);
    argon2
        .hash_password_into(password, salt, output.as_mut())
        .map_err(|e| KeywardError::Keyring(format!("Argon2id key derivation failed: {e}")))?;

    Ok(output)
}

/// Random salt for a new keyring.
pub fn generate_salt() -> Result<[u8; SALT_LEN], KeywardError> {
    crypto::random_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHEAP: KdfParams = KdfParams {
        memory_cost: 8192,
        iterations: 1,
        parallelism: 1,
    };

    #[test]
    fn derivation_is_deterministic() {
        let salt = [1u8; SALT_LEN];
        let a = derive_key(b"correct horse", &salt, &CHEAP).unwrap();
        let b = derive_key(b"correct horse", &salt, &CHEAP).unwrap();
        assert_eq!(*a, *b);
    }

    #[test]
    fn password_and_salt_both_matter() {
        let a = derive_key(b"one", &[1u8; SALT_LEN], &CHEAP).unwrap();
        let b = derive_key(b"two", &[1u8; SALT_LEN], &CHEAP).unwrap();
        let c = derive_key(b"one", &[2u8; SALT_LEN], &CHEAP).unwrap();
        assert_ne!(*a, *b);
        assert_ne!(*a, *c);
    }

    #[test]
    fn salts_are_random() {
        assert_ne!(generate_salt().unwrap(), generate_salt().unwrap());
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        let params = KdfParams {
            memory_cost: 1,
            iterations: 0,
            parallelism: 0,
        };
        let err = derive_key(b"pw", &[0u8; SALT_LEN], &params).unwrap_err();
        assert!(matches!(err, KeywardError::Keyring(_)));
    }

    #[test]
    fn limits_reject_oversized_parameters() {
        assert!(CHEAP.check_limits().is_ok());
        assert!(KdfParams::default().check_limits().is_ok());
        for params in [
            KdfParams { memory_cost: u32::MAX, ..CHEAP },
            KdfParams { iterations: 1_000_000, ..CHEAP },
            KdfParams { parallelism: 0, ..CHEAP },
            KdfParams { parallelism: 65, ..CHEAP },
        ] {
            assert!(matches!(params.check_limits(), Err(KeywardError::Keyring(_))));
        }
    }

    #[test]
    fn params_follow_vault_config() {
        let config = VaultConfig {
            kdf_memory_cost: 32768,
            kdf_iterations: 2,
            kdf_parallelism: 1,
        };
        let params = KdfParams::from(&config);
        assert_eq!(params.memory_cost, 32768);
        assert_eq!(params.iterations, 2);
        assert_eq!(params.parallelism, 1);
    }
}
