//! Symmetric encryption with a Poseidon keystream.
//!
//! The ciphertext is `[iv, c_0, .., c_{n-1}]` where `iv` is the digest of the
//! plaintext and `c_i = p_i + poseidon([key, iv + nonce + i])`. The digest
//! doubles as an integrity tag for the strict decryption path.

use crate::error::CryptoError;
use crate::hashing::{hash_many, poseidon};
use crate::Fr;

fn keystream(key: &Fr, iv: &Fr, nonce: &Fr, index: usize) -> Result<Fr, CryptoError> {
    poseidon(&[*key, *iv + nonce + Fr::from(index as u64)])
}

pub fn poseidon_encrypt(plaintext: &[Fr], key: &Fr, nonce: &Fr) -> Result<Vec<Fr>, CryptoError> {
    if plaintext.is_empty() {
        return Err(CryptoError::Validation(String::from(
            "cannot encrypt an empty plaintext",
        )));
    }
    let iv = hash_many(plaintext)?;

    let mut ciphertext = Vec::with_capacity(plaintext.len() + 1);
    ciphertext.push(iv);
    for (i, p) in plaintext.iter().enumerate() {
        ciphertext.push(*p + keystream(key, &iv, nonce, i)?);
    }
    Ok(ciphertext)
}

/// Recovers `length` plaintext elements without checking their digest.
///
/// Used when the sender may be adversarial: a wrong key yields garbage rather
/// than an error, and the caller decides what to do with it.
pub fn poseidon_decrypt_without_check(
    ciphertext: &[Fr],
    key: &Fr,
    nonce: &Fr,
    length: usize,
) -> Result<Vec<Fr>, CryptoError> {
    if length == 0 {
        return Err(CryptoError::Validation(String::from(
            "cannot decrypt an empty plaintext",
        )));
    }
    if ciphertext.len() < length + 1 {
        return Err(CryptoError::InvalidLength {
            expected: length + 1,
            actual: ciphertext.len(),
        });
    }
    let iv = ciphertext[0];
    ciphertext[1..=length]
        .iter()
        .enumerate()
        .map(|(i, c)| -> Result<Fr, CryptoError> { Ok(*c - keystream(key, &iv, nonce, i)?) })
        .collect()
}

/// Recovers `length` plaintext elements and checks them against the iv.
pub fn poseidon_decrypt(
    ciphertext: &[Fr],
    key: &Fr,
    nonce: &Fr,
    length: usize,
) -> Result<Vec<Fr>, CryptoError> {
    let plaintext = poseidon_decrypt_without_check(ciphertext, key, nonce, length)?;
    if hash_many(&plaintext)? != ciphertext[0] {
        return Err(CryptoError::DecryptionFailed);
    }
    Ok(plaintext)
}
