//! EdDSA over baby jubjub with a Poseidon challenge, verifiable inside a
//! circuit.

use ark_ec::CurveGroup;
use ark_ff::PrimeField;
use num_bigint::BigUint;

use crate::babyjub::{base8, mul_scalar, sub_order, Point, SubgroupScalar};
use crate::error::CryptoError;
use crate::hashing::poseidon;
use crate::keys::pruned_key_digest;
use crate::utils::{convert_field, digest_blake512, field_to_biguint, field_to_le_bytes};
use crate::Fr;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Signature {
    pub r8: Point,
    pub s: Fr,
}

fn challenge(r8: &Point, pub_key: &Point, msg: &Fr) -> Result<Fr, CryptoError> {
    poseidon(&[r8.x, r8.y, pub_key.x, pub_key.y, *msg])
}

/// Deterministically signs a single field element.
pub fn sign(priv_key: &Fr, msg: &Fr) -> Result<Signature, CryptoError> {
    let (scalar, prefix) = pruned_key_digest(priv_key);
    let s = BigUint::from_bytes_le(&scalar);
    let pub_key = mul_scalar(&base8(), &(&s >> 3usize));

    let nonce_digest = digest_blake512(&[&prefix, &field_to_le_bytes(msg)]);
    let r = SubgroupScalar::from_le_bytes_mod_order(&nonce_digest);
    let r8 = (base8() * r).into_affine();

    let hm = challenge(&r8, &pub_key, msg)?;
    let hm_sub: SubgroupScalar = convert_field(&hm);
    let s_sub = SubgroupScalar::from_le_bytes_mod_order(&scalar);
    let big_s = r + hm_sub * s_sub;

    Ok(Signature {
        r8,
        s: convert_field(&big_s),
    })
}

/// Checks `Base8 * S == R8 + (8 * hm) * A`. Malformed signatures and keys
/// are reported as `false`.
pub fn verify_signature(msg: &Fr, signature: &Signature, pub_key: &Point) -> bool {
    if !signature.r8.is_on_curve() || !pub_key.is_on_curve() {
        return false;
    }
    let s = field_to_biguint(&signature.s);
    if s >= sub_order() {
        return false;
    }
    let hm = match challenge(&signature.r8, pub_key, msg) {
        Ok(hm) => hm,
        Err(_) => return false,
    };

    let left = mul_scalar(&base8(), &s);
    let scaled_hm = field_to_biguint(&hm) * 8u32;
    let right = (signature.r8 + mul_scalar(pub_key, &scaled_hm)).into_affine();
    left == right
}
