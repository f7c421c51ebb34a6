use ark_ff::{BigInteger, PrimeField};
use light_poseidon::{Poseidon, PoseidonHasher};

use crate::error::CryptoError;
use crate::utils::digest_sha256;
use crate::Fr;

/// Largest number of inputs a single circom Poseidon instance accepts.
pub const MAX_POSEIDON_INPUTS: usize = 12;

/// Circom compatible Poseidon over the BN254 scalar field, for 1 to 12 inputs.
pub fn poseidon(inputs: &[Fr]) -> Result<Fr, CryptoError> {
    if inputs.is_empty() || inputs.len() > MAX_POSEIDON_INPUTS {
        return Err(CryptoError::Validation(format!(
            "Poseidon takes between 1 and {MAX_POSEIDON_INPUTS} inputs, got {}",
            inputs.len()
        )));
    }
    let mut hasher =
        Poseidon::<Fr>::new_circom(inputs.len()).map_err(|e| CryptoError::Hash(e.to_string()))?;
    hasher.hash(inputs).map_err(|e| CryptoError::Hash(e.to_string()))
}

/// Hashes exactly `n` elements, zero padding shorter inputs.
pub fn hash_n(n: usize, elements: &[Fr]) -> Result<Fr, CryptoError> {
    if elements.len() > n {
        return Err(CryptoError::Validation(format!(
            "the length of the elements array should be at most {n}; got {}",
            elements.len()
        )));
    }
    let mut padded = elements.to_vec();
    padded.resize(n, Fr::from(0u64));
    poseidon(&padded)
}

pub fn hash_left_right(left: &Fr, right: &Fr) -> Result<Fr, CryptoError> {
    poseidon(&[*left, *right])
}

/// Hash of a single element, `poseidon([x, 0])`.
pub fn hash_one(x: &Fr) -> Result<Fr, CryptoError> {
    poseidon(&[*x, Fr::from(0u64)])
}

pub fn hash2(elements: &[Fr]) -> Result<Fr, CryptoError> {
    hash_n(2, elements)
}

pub fn hash3(elements: &[Fr]) -> Result<Fr, CryptoError> {
    hash_n(3, elements)
}

pub fn hash4(elements: &[Fr]) -> Result<Fr, CryptoError> {
    hash_n(4, elements)
}

pub fn hash5(elements: &[Fr]) -> Result<Fr, CryptoError> {
    hash_n(5, elements)
}

pub fn hash12(elements: &[Fr]) -> Result<Fr, CryptoError> {
    hash_n(12, elements)
}

/// Digest of an arbitrary length, non-empty array.
///
/// Up to 12 elements are hashed with a single Poseidon call. Longer arrays are
/// absorbed as a chain: the first 12 elements are hashed, then the running
/// digest is hashed together with the next 11 elements until none are left.
pub fn hash_many(elements: &[Fr]) -> Result<Fr, CryptoError> {
    if elements.is_empty() {
        return Err(CryptoError::Validation(String::from(
            "cannot hash an empty array",
        )));
    }
    if elements.len() <= MAX_POSEIDON_INPUTS {
        return poseidon(elements);
    }

    let mut acc = poseidon(&elements[..MAX_POSEIDON_INPUTS])?;
    for chunk in elements[MAX_POSEIDON_INPUTS..].chunks(MAX_POSEIDON_INPUTS - 1) {
        let mut inputs = Vec::with_capacity(chunk.len() + 1);
        inputs.push(acc);
        inputs.extend_from_slice(chunk);
        acc = poseidon(&inputs)?;
    }
    Ok(acc)
}

/// SHA-256 over the 32-byte big-endian encodings of `values`, reduced mod r.
/// Matches `uint256(sha256(abi.encodePacked(values))) % r` on the EVM.
pub fn sha256_hash(values: &[Fr]) -> Fr {
    let words: Vec<Vec<u8>> = values
        .iter()
        .map(|v| v.into_bigint().to_bytes_be())
        .collect();
    let slices: Vec<&[u8]> = words.iter().map(|w| w.as_slice()).collect();
    let digest = digest_sha256(&slices);
    Fr::from_be_bytes_mod_order(&digest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::field_from_decimal;
    use ark_ff::UniformRand;
    use rand::thread_rng;

    fn fr(n: u64) -> Fr {
        Fr::from(n)
    }

    #[test]
    fn test_poseidon_circom_vectors() {
        let expected_one: Fr = field_from_decimal(
            "18586133768512220936620570745912940619677854269274689475585506675881198879027",
        )
        .unwrap();
        assert_eq!(poseidon(&[fr(1)]).unwrap(), expected_one);

        let expected_two: Fr = field_from_decimal(
            "7853200120776062878684798364095072458815029376092732009249414926327459813530",
        )
        .unwrap();
        assert_eq!(hash_left_right(&fr(1), &fr(2)).unwrap(), expected_two);
    }

    #[test]
    fn test_poseidon_rejects_bad_arity() {
        assert!(poseidon(&[]).is_err());
        assert!(poseidon(&vec![fr(1); 13]).is_err());
        assert!(poseidon(&vec![fr(1); 12]).is_ok());
    }

    #[test]
    fn test_hash_n_pads_with_zeros() {
        let padded = hash5(&[fr(1), fr(2)]).unwrap();
        let explicit = poseidon(&[fr(1), fr(2), fr(0), fr(0), fr(0)]).unwrap();
        assert_eq!(padded, explicit);
        assert!(hash4(&[fr(1); 5]).is_err());
        assert_eq!(hash_one(&fr(7)).unwrap(), hash2(&[fr(7)]).unwrap());
    }

    #[test]
    fn test_hash_many_chains_long_inputs() {
        let mut rng = thread_rng();
        let short: Vec<Fr> = (0..9).map(|_| Fr::rand(&mut rng)).collect();
        assert_eq!(hash_many(&short).unwrap(), poseidon(&short).unwrap());

        let long: Vec<Fr> = (0..30).map(|_| Fr::rand(&mut rng)).collect();
        let first = poseidon(&long[..12]).unwrap();
        let mut second_in = vec![first];
        second_in.extend_from_slice(&long[12..23]);
        let second = poseidon(&second_in).unwrap();
        let mut third_in = vec![second];
        third_in.extend_from_slice(&long[23..]);
        let third = poseidon(&third_in).unwrap();
        assert_eq!(hash_many(&long).unwrap(), third);

        assert!(hash_many(&[]).is_err());
    }

    #[test]
    fn test_sha256_hash_is_reduced() {
        let h = sha256_hash(&[fr(0), fr(1)]);
        let again = sha256_hash(&[fr(0), fr(1)]);
        assert_eq!(h, again);
        assert_ne!(h, sha256_hash(&[fr(1), fr(0)]));
    }
}
