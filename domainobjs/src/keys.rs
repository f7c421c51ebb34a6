use ark_ff::MontFp;
use maci_crypto::babyjub::Point;
use maci_crypto::hashing::hash_left_right;
use maci_crypto::keys::{
    format_priv_key_for_babyjub, gen_ecdh_shared_key, gen_priv_key, gen_pub_key, pack_pub_key,
    unpack_pub_key,
};
use maci_crypto::utils::{field_from_biguint, field_to_be_bytes};
use maci_crypto::Fr;
use num_bigint::BigUint;
use rand::Rng;

use crate::error::DomainObjsError;
use crate::serde_types::{decode_hex_padded, field_to_decimal_string, PubKeyContractParam};

pub const SERIALIZED_PRIV_KEY_PREFIX: &str = "macisk.";
pub const SERIALIZED_PUB_KEY_PREFIX: &str = "macipk.";

// First Pedersen generator of circomlib, a point nobody knows the discrete log of.
const PADDING_KEY_X: Fr =
    MontFp!("10457101036533406547632367118273992217979173478358440826365724437999023779287");
const PADDING_KEY_Y: Fr =
    MontFp!("19824078218392094440610104313265183977899662750282163392862422243483260492317");

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PrivateKey {
    raw: Fr,
}

impl PrivateKey {
    pub fn new(raw: Fr) -> Self {
        PrivateKey { raw }
    }

    pub fn random<R: Rng>(rng: &mut R) -> Self {
        PrivateKey { raw: gen_priv_key(rng) }
    }

    pub fn raw(&self) -> Fr {
        self.raw
    }

    /// The formatted scalar the circuits multiply with `Base8`.
    pub fn as_circuit_inputs(&self) -> Fr {
        Fr::from(format_priv_key_for_babyjub(&self.raw))
    }

    pub fn serialize(&self) -> String {
        format!(
            "{SERIALIZED_PRIV_KEY_PREFIX}{}",
            hex::encode(field_to_be_bytes(&self.raw))
        )
    }

    pub fn deserialize(serialized: &str) -> Result<Self, DomainObjsError> {
        let body = serialized
            .strip_prefix(SERIALIZED_PRIV_KEY_PREFIX)
            .ok_or_else(|| DomainObjsError::Serialization(format!("'{serialized}' is not a private key")))?;
        if body.is_empty() {
            return Err(DomainObjsError::Serialization(String::from("empty private key")));
        }
        let value = BigUint::from_bytes_be(&decode_hex_padded(body)?);
        Ok(PrivateKey { raw: field_from_biguint(&value)? })
    }

    pub fn is_valid_serialized(serialized: &str) -> bool {
        Self::deserialize(serialized).is_ok()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PublicKey {
    raw: Point,
}

impl PublicKey {
    pub fn new(raw: Point) -> Result<Self, DomainObjsError> {
        if !raw.is_on_curve() {
            return Err(DomainObjsError::Validation(String::from(
                "public key is not on the baby jubjub curve",
            )));
        }
        Ok(PublicKey { raw })
    }

    /// Skips the curve check. Used for keys decoded out of ciphertexts that
    /// may have been produced with the wrong shared key.
    pub fn new_unchecked(raw: Point) -> Self {
        PublicKey { raw }
    }

    /// Public key with an unknown private key, used to fill blank state leaves.
    pub fn padding_key() -> Self {
        PublicKey::new_unchecked(Point::new_unchecked(PADDING_KEY_X, PADDING_KEY_Y))
    }

    pub fn point(&self) -> Point {
        self.raw
    }

    pub fn x(&self) -> Fr {
        self.raw.x
    }

    pub fn y(&self) -> Fr {
        self.raw.y
    }

    pub fn as_array(&self) -> [Fr; 2] {
        [self.raw.x, self.raw.y]
    }

    pub fn hash(&self) -> Result<Fr, DomainObjsError> {
        Ok(hash_left_right(&self.raw.x, &self.raw.y)?)
    }

    pub fn as_contract_param(&self) -> PubKeyContractParam {
        PubKeyContractParam {
            x: field_to_decimal_string(&self.raw.x),
            y: field_to_decimal_string(&self.raw.y),
        }
    }

    /// `macipk.` followed by the hex of the 32 packed bytes, in packing order.
    pub fn serialize(&self) -> String {
        format!(
            "{SERIALIZED_PUB_KEY_PREFIX}{}",
            hex::encode(pack_pub_key(&self.raw))
        )
    }

    pub fn deserialize(serialized: &str) -> Result<Self, DomainObjsError> {
        let body = serialized
            .strip_prefix(SERIALIZED_PUB_KEY_PREFIX)
            .ok_or_else(|| DomainObjsError::Serialization(format!("'{serialized}' is not a public key")))?;
        if body.is_empty() {
            return Err(DomainObjsError::Serialization(String::from("empty public key")));
        }
        let bytes = hex::decode(body)
            .map_err(|e| DomainObjsError::Serialization(format!("Invalid hex: {e}")))?;
        let packed: [u8; 32] = bytes.as_slice().try_into().map_err(|_| {
            DomainObjsError::Serialization(format!(
                "packed public key has {} bytes, expected 32",
                bytes.len()
            ))
        })?;
        PublicKey::new(unpack_pub_key(&packed)?)
    }

    pub fn is_valid_serialized(serialized: &str) -> bool {
        Self::deserialize(serialized).is_ok()
    }
}

#[derive(Clone, Debug)]
pub struct Keypair {
    pub priv_key: PrivateKey,
    pub pub_key: PublicKey,
}

impl Keypair {
    pub fn new(priv_key: PrivateKey) -> Self {
        Self::from_private_key(priv_key)
    }

    pub fn random<R: Rng>(rng: &mut R) -> Self {
        Self::from_private_key(PrivateKey::random(rng))
    }

    pub fn from_private_key(priv_key: PrivateKey) -> Self {
        let pub_key = PublicKey::new_unchecked(gen_pub_key(&priv_key.raw()));
        Keypair { priv_key, pub_key }
    }

    /// Compares two keypairs, refusing pairs where only one half matches.
    pub fn try_eq(&self, other: &Keypair) -> Result<bool, DomainObjsError> {
        let same_priv = self.priv_key == other.priv_key;
        let same_pub = self.pub_key == other.pub_key;
        if same_priv != same_pub {
            return Err(DomainObjsError::Validation(String::from(
                "keypair has a private key that does not match its public key",
            )));
        }
        Ok(same_priv)
    }

    pub fn gen_ecdh_shared_key(
        priv_key: &PrivateKey,
        pub_key: &PublicKey,
    ) -> Result<Fr, DomainObjsError> {
        Ok(gen_ecdh_shared_key(&priv_key.raw(), &pub_key.point())?)
    }
}

impl PartialEq for Keypair {
    fn eq(&self, other: &Self) -> bool {
        self.priv_key == other.priv_key && self.pub_key == other.pub_key
    }
}

impl Eq for Keypair {}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::thread_rng;
    use rand_chacha::rand_core::SeedableRng;

    #[test]
    fn test_priv_key_serialization() {
        let one = PrivateKey::new(Fr::from(1u64));
        let serialized = one.serialize();
        assert_eq!(serialized, format!("macisk.{}1", "0".repeat(63)));
        assert_eq!(PrivateKey::deserialize(&serialized).unwrap(), one);
        assert_eq!(PrivateKey::deserialize("macisk.1").unwrap(), one);

        let mut rng = thread_rng();
        let sk = PrivateKey::random(&mut rng);
        assert_eq!(PrivateKey::deserialize(&sk.serialize()).unwrap(), sk);
    }

    #[test]
    fn test_invalid_serialized_keys() {
        assert!(!PrivateKey::is_valid_serialized("macipk.01"));
        assert!(!PrivateKey::is_valid_serialized("macisk."));
        assert!(!PrivateKey::is_valid_serialized("macisk.xyz"));
        assert!(!PrivateKey::is_valid_serialized(&format!("macisk.{}", "f".repeat(64))));
        assert!(!PublicKey::is_valid_serialized("macisk.01"));
        assert!(!PublicKey::is_valid_serialized("macipk."));
    }

    #[test]
    fn test_pub_key_serialization() {
        let mut rng = rand_chacha::ChaCha8Rng::from_seed([3u8; 32]);
        for _ in 0..8 {
            let keypair = Keypair::random(&mut rng);
            let serialized = keypair.pub_key.serialize();
            assert!(serialized.starts_with(SERIALIZED_PUB_KEY_PREFIX));
            assert_eq!(serialized.len(), SERIALIZED_PUB_KEY_PREFIX.len() + 64);
            assert!(PublicKey::is_valid_serialized(&serialized));
            assert_eq!(PublicKey::deserialize(&serialized).unwrap(), keypair.pub_key);
        }
    }

    #[test]
    fn test_known_serialized_keypairs() {
        let pairs = [
            (
                "macisk.49953af3585856f539d194b46c82f4ed54ec508fb9b882940cbe68bbc57e59e",
                "macipk.c974f4f168b79727ac98bfd53a65ea0b4e45dc2552fe73df9f8b51ebb0930330",
            ),
            (
                "macisk.14db4cdf1fb42bee444c83aed43c40db6b1a2c79fa1067332b09b5dff0df19c5",
                "macipk.d30bf8402e7d731e86ccc6d24726446bba3ee18e8df013ebb0c96a5b14914da9",
            ),
        ];
        for (sk, pk) in pairs {
            let keypair = Keypair::new(PrivateKey::deserialize(sk).unwrap());
            assert_eq!(keypair.pub_key.serialize(), pk);
            assert_eq!(PublicKey::deserialize(pk).unwrap(), keypair.pub_key);
        }

        let coordinator = Keypair::new(PrivateKey::deserialize(pairs[0].0).unwrap());
        let voter = Keypair::new(PrivateKey::deserialize(pairs[1].0).unwrap());
        let published = PublicKey::deserialize(pairs[0].1).unwrap();
        assert_eq!(
            Keypair::gen_ecdh_shared_key(&voter.priv_key, &published).unwrap(),
            Keypair::gen_ecdh_shared_key(&coordinator.priv_key, &voter.pub_key).unwrap()
        );
    }

    #[test]
    fn test_pub_key_wrong_length() {
        assert!(!PublicKey::is_valid_serialized("macipk.c974f4f1"));
        assert!(!PublicKey::is_valid_serialized(&format!("macipk.{}", "0".repeat(66))));
    }

    #[test]
    fn test_padding_key_is_on_curve() {
        let padding = PublicKey::padding_key();
        assert!(padding.point().is_on_curve());
        assert!(PublicKey::new(padding.point()).is_ok());
        assert!(PublicKey::new(Point::new_unchecked(Fr::from(1u64), Fr::from(1u64))).is_err());
    }

    #[test]
    fn test_keypair_equality() {
        let mut rng = thread_rng();
        let a = Keypair::random(&mut rng);
        let b = Keypair::random(&mut rng);
        assert!(a.try_eq(&a.clone()).unwrap());
        assert!(!a.try_eq(&b).unwrap());

        let mismatched = Keypair { priv_key: a.priv_key, pub_key: b.pub_key };
        assert!(a.try_eq(&mismatched).is_err());
        assert_ne!(a, mismatched);
    }

    #[test]
    fn test_shared_key_is_symmetric() {
        let mut rng = thread_rng();
        let a = Keypair::random(&mut rng);
        let b = Keypair::random(&mut rng);
        assert_eq!(
            Keypair::gen_ecdh_shared_key(&a.priv_key, &b.pub_key).unwrap(),
            Keypair::gen_ecdh_shared_key(&b.priv_key, &a.pub_key).unwrap()
        );
        assert!(a.priv_key.as_circuit_inputs() != Fr::from(0u64));
    }
}
