use ark_ff::{BigInteger, PrimeField};
use num_bigint::BigUint;
use sha2::{Digest, Sha256};

use crate::error::CryptoError;
use crate::Fr;

pub fn digest_sha256(data: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for &d in data.iter() {
        hasher.update(d);
    }
    hasher.finalize().into()
}

/// BLAKE-512 (the SHA-3 finalist, not BLAKE2b) over the concatenation of `data`.
pub fn digest_blake512(data: &[&[u8]]) -> [u8; 64] {
    use blake_hash::{Blake512, Digest};

    let mut hasher = Blake512::new();
    for &d in data.iter() {
        hasher.update(d);
    }
    let mut out = [0u8; 64];
    out.copy_from_slice(&hasher.finalize());
    out
}

/// The BN254 scalar field modulus, i.e. the SNARK field size.
pub fn snark_field_size() -> BigUint {
    Fr::MODULUS.into()
}

pub fn field_to_biguint<F: PrimeField>(value: &F) -> BigUint {
    (*value).into()
}

/// Converts an integer to a field element, rejecting values `>= modulus`
/// instead of silently reducing them.
pub fn field_from_biguint<F: PrimeField>(value: &BigUint) -> Result<F, CryptoError> {
    let modulus: BigUint = F::MODULUS.into();
    if *value >= modulus {
        return Err(CryptoError::OutOfRange(format!(
            "{value} is not smaller than the field modulus"
        )));
    }
    Ok(F::from(value.clone()))
}

pub fn field_from_decimal<F: PrimeField>(s: &str) -> Result<F, CryptoError> {
    let trimmed = s.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CryptoError::Validation(format!("'{s}' is not a decimal integer")));
    }
    let value = BigUint::parse_bytes(trimmed.as_bytes(), 10)
        .ok_or_else(|| CryptoError::Validation(format!("'{s}' is not a decimal integer")))?;
    field_from_biguint(&value)
}

pub fn field_to_decimal<F: PrimeField>(value: &F) -> String {
    field_to_biguint(value).to_str_radix(10)
}

/// 32-byte big-endian encoding of a field element.
pub fn field_to_be_bytes(value: &Fr) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(&value.into_bigint().to_bytes_be());
    out
}

/// 32-byte little-endian encoding of a field element.
pub fn field_to_le_bytes(value: &Fr) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(&value.into_bigint().to_bytes_le());
    out
}

/// Reinterprets an element of one prime field as an integer in another,
/// reducing modulo the target modulus.
pub fn convert_field<A: PrimeField, B: PrimeField>(value: &A) -> B {
    B::from_le_bytes_mod_order(&value.into_bigint().to_bytes_le())
}
