use num_bigint::BigUint;
use rand::Rng;

use crate::babyjub::{base8, mul_scalar, pack_point, unpack_point, Point};
use crate::error::CryptoError;
use crate::utils::{digest_blake512, field_to_biguint, snark_field_size};
use crate::Fr;

/// Samples a uniform value below the SNARK field size.
///
/// 256-bit candidates are rejected while they fall below `2^256 mod r`, so
/// the accepted range is a whole number of copies of the field and the
/// reduction introduces no bias.
pub fn gen_random_babyjub_value<R: Rng>(rng: &mut R) -> Fr {
    let modulus = snark_field_size();
    let min = (BigUint::from(1u8) << 256usize) % &modulus;

    loop {
        let mut bytes = [0u8; 32];
        rng.fill(&mut bytes);
        let candidate = BigUint::from_bytes_be(&bytes);
        if candidate >= min {
            return Fr::from(candidate % &modulus);
        }
    }
}

pub fn gen_priv_key<R: Rng>(rng: &mut R) -> Fr {
    gen_random_babyjub_value(rng)
}

pub fn gen_random_salt<R: Rng>(rng: &mut R) -> Fr {
    gen_random_babyjub_value(rng)
}

/// Bytes the private key is hashed from: its minimal hex digits read in
/// pairs. An odd trailing digit is dropped, which is how existing
/// deployments derived their keys.
fn priv_key_bytes(priv_key: &Fr) -> Vec<u8> {
    let value = field_to_biguint(priv_key);
    let digits = value.bits().div_ceil(4).max(1);
    if digits % 2 == 0 {
        return value.to_bytes_be();
    }
    let truncated = value >> 4usize;
    if truncated.bits() == 0 {
        Vec::new()
    } else {
        truncated.to_bytes_be()
    }
}

/// Expands and prunes a private key the way EdDSA does: the first half of
/// `BLAKE-512(sk)` with the low three bits cleared and bit 254 set. The
/// second half seeds signature nonces.
pub(crate) fn pruned_key_digest(priv_key: &Fr) -> ([u8; 32], [u8; 32]) {
    let digest = digest_blake512(&[&priv_key_bytes(priv_key)]);
    let mut scalar = [0u8; 32];
    let mut prefix = [0u8; 32];
    scalar.copy_from_slice(&digest[..32]);
    prefix.copy_from_slice(&digest[32..]);

    scalar[0] &= 0xF8;
    scalar[31] &= 0x7F;
    scalar[31] |= 0x40;
    (scalar, prefix)
}

/// Scalar actually multiplied with `Base8` to derive the public key.
pub fn format_priv_key_for_babyjub(priv_key: &Fr) -> BigUint {
    let (scalar, _) = pruned_key_digest(priv_key);
    BigUint::from_bytes_le(&scalar) >> 3usize
}

pub fn gen_pub_key(priv_key: &Fr) -> Point {
    mul_scalar(&base8(), &format_priv_key_for_babyjub(priv_key))
}

pub fn gen_keypair<R: Rng>(rng: &mut R) -> (Fr, Point) {
    let priv_key = gen_priv_key(rng);
    let pub_key = gen_pub_key(&priv_key);
    (priv_key, pub_key)
}

/// X coordinate of `format(priv_key) * pub_key`.
pub fn gen_ecdh_shared_key(priv_key: &Fr, pub_key: &Point) -> Result<Fr, CryptoError> {
    if !pub_key.is_on_curve() {
        return Err(CryptoError::PointNotOnCurve);
    }
    Ok(mul_scalar(pub_key, &format_priv_key_for_babyjub(priv_key)).x)
}

pub fn pack_pub_key(pub_key: &Point) -> [u8; 32] {
    pack_point(pub_key)
}

pub fn unpack_pub_key(packed: &[u8; 32]) -> Result<Point, CryptoError> {
    unpack_point(packed)
}

/// Whether the scalar is already reduced below the field modulus.
pub fn is_canonical(value: &BigUint) -> bool {
    *value < snark_field_size()
}
