// SPDX-FileCopyrightText: 2026 Keyward Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! AES-256-GCM seal/open.
//!
//! Every [`seal`] draws a fresh random 96-bit nonce from the system CSPRNG;
//! a nonce must never repeat under one key.

use keyward_core::KeywardError;
use ring::aead::{AES_256_GCM, Aad, LessSafeKey, Nonce, UnboundKey};
use ring::rand::{SecureRandom, SystemRandom};
use zeroize::Zeroizing;

pub const KEY_LEN: usize = 32;
pub const NONCE_LEN: usize = 12;
pub const TAG_LEN: usize = 16;

fn aead_key(key: &[u8; KEY_LEN]) -> Result<LessSafeKey, KeywardError> {
    UnboundKey::new(&AES_256_GCM, key)
        .map(LessSafeKey::new)
        .map_err(|_| KeywardError::Keyring("failed to create AES-256-GCM key".to_string()))
}

/// Encrypt `plaintext`, returning `(ciphertext_with_tag, nonce)`.
pub fn seal(
    key: &[u8; KEY_LEN],
    plaintext: &[u8],
) -> Result<(Vec<u8>, [u8; NONCE_LEN]), KeywardError> {
    let key = aead_key(key)?;
    let nonce_bytes: [u8; NONCE_LEN] = random_bytes()?;

    let mut in_out = plaintext.to_vec();
    key.seal_in_place_append_tag(
        Nonce::assume_unique_for_key(nonce_bytes),
        Aad::empty(),
        &mut in_out,
    )
    .map_err(|_| KeywardError::Keyring("AES-256-GCM encryption failed".to_string()))?;

    Ok((in_out, nonce_bytes))
}

/// Decrypt and authenticate `ciphertext` (tag appended).
///
/// Fails on a wrong key or any modification of the ciphertext.
pub fn open(
    key: &[u8; KEY_LEN],
    nonce: &[u8; NONCE_LEN],
    ciphertext: &[u8],
) -> Result<Zeroizing<Vec<u8>>, KeywardError> {
    let key = aead_key(key)?;
    let mut in_out = Zeroizing::new(ciphertext.to_vec());
    let len = key
        .open_in_place(Nonce::assume_unique_for_key(*nonce), Aad::empty(), &mut in_out)
        .map_err(|_| {
            KeywardError::AuthFailure("decryption failed, wrong key or corrupted data".to_string())
        })?
        .len();
    in_out.truncate(len);
    Ok(in_out)
}

/// Random 32-byte key for AES-256-GCM.
pub fn generate_key() -> Result<Zeroizing<[u8; KEY_LEN]>, KeywardError> {
    random_bytes().map(Zeroizing::new)
}

/// Fill a fixed-size array from the system CSPRNG.
pub fn random_bytes<const N: usize>() -> Result<[u8; N], KeywardError> {
    let mut buf = [0u8; N];
    SystemRandom::new()
        .fill(&mut buf)
        .map_err(|_| KeywardError::Keyring("system random source failed".to_string()))?;
    Ok(buf)
}
