use maci_crypto::babyjub::Point;
use maci_crypto::eddsa::{sign, verify_signature, Signature};
use maci_crypto::encryption::{poseidon_decrypt, poseidon_decrypt_without_check, poseidon_encrypt};
use maci_crypto::hashing::hash4;
use maci_crypto::keys::gen_random_salt;
use maci_crypto::Fr;
use num_bigint::BigUint;
use rand::Rng;

use crate::commands::message::Message;
use crate::error::DomainObjsError;
use crate::keys::{PrivateKey, PublicKey};
use crate::serde_types::{decimal_to_field, field_to_decimal_string, VoteCommandJson};

/// Width of each integer field packed into the first command element.
pub const PACKED_FIELD_BITS: usize = 50;

const STATE_INDEX_POS: usize = 0;
const VOTE_OPTION_INDEX_POS: usize = 50;
const NEW_VOTE_WEIGHT_POS: usize = 100;
const NONCE_POS: usize = 150;
const POLL_ID_POS: usize = 200;

// as_array() ++ [R8.x, R8.y, S] ++ two zero elements
const PLAINTEXT_LENGTH: usize = 9;
const SIGNED_LENGTH: usize = 7;

/// A voter's instruction to change their key and/or their vote.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VoteCommand {
    pub state_index: u64,
    pub new_pub_key: PublicKey,
    pub vote_option_index: u64,
    pub new_vote_weight: u64,
    pub nonce: u64,
    pub poll_id: u64,
    pub salt: Fr,
}

fn check_packed_field(name: &str, value: u64) -> Result<(), DomainObjsError> {
    if value >> PACKED_FIELD_BITS != 0 {
        return Err(DomainObjsError::Validation(format!(
            "{name} must be smaller than 2^{PACKED_FIELD_BITS}, got {value}"
        )));
    }
    Ok(())
}

fn extract(packed: &BigUint, pos: usize) -> u64 {
    let mask = (BigUint::from(1u8) << PACKED_FIELD_BITS) - 1u8;
    let value = (packed >> pos) & mask;
    value.iter_u64_digits().next().unwrap_or(0)
}

impl VoteCommand {
    pub fn new(
        state_index: u64,
        new_pub_key: PublicKey,
        vote_option_index: u64,
        new_vote_weight: u64,
        nonce: u64,
        poll_id: u64,
        salt: Fr,
    ) -> Result<Self, DomainObjsError> {
        check_packed_field("state index", state_index)?;
        check_packed_field("vote option index", vote_option_index)?;
        check_packed_field("new vote weight", new_vote_weight)?;
        check_packed_field("nonce", nonce)?;
        check_packed_field("poll id", poll_id)?;

        Ok(VoteCommand {
            state_index,
            new_pub_key,
            vote_option_index,
            new_vote_weight,
            nonce,
            poll_id,
            salt,
        })
    }

    /// Same as [`VoteCommand::new`] with a fresh random salt.
    pub fn with_random_salt<R: Rng>(
        rng: &mut R,
        state_index: u64,
        new_pub_key: PublicKey,
        vote_option_index: u64,
        new_vote_weight: u64,
        nonce: u64,
        poll_id: u64,
    ) -> Result<Self, DomainObjsError> {
        let salt = gen_random_salt(rng);
        Self::new(state_index, new_pub_key, vote_option_index, new_vote_weight, nonce, poll_id, salt)
    }

    /// The five integer fields packed 50 bits apart into one field element.
    pub fn packed(&self) -> Fr {
        let packed = BigUint::from(self.state_index) << STATE_INDEX_POS
            | BigUint::from(self.vote_option_index) << VOTE_OPTION_INDEX_POS
            | BigUint::from(self.new_vote_weight) << NEW_VOTE_WEIGHT_POS
            | BigUint::from(self.nonce) << NONCE_POS
            | BigUint::from(self.poll_id) << POLL_ID_POS;
        Fr::from(packed)
    }

    pub fn as_array(&self) -> [Fr; 4] {
        [self.packed(), self.new_pub_key.x(), self.new_pub_key.y(), self.salt]
    }

    pub fn hash(&self) -> Result<Fr, DomainObjsError> {
        Ok(hash4(&self.as_array())?)
    }

    pub fn sign(&self, priv_key: &PrivateKey) -> Result<Signature, DomainObjsError> {
        Ok(sign(&priv_key.raw(), &self.hash()?)?)
    }

    pub fn verify_signature(&self, signature: &Signature, pub_key: &PublicKey) -> bool {
        match self.hash() {
            Ok(hash) => verify_signature(&hash, signature, &pub_key.point()),
            Err(_) => false,
        }
    }

    pub fn encrypt(&self, signature: &Signature, shared_key: &Fr) -> Result<Message, DomainObjsError> {
        let mut plaintext = self.as_array().to_vec();
        plaintext.extend_from_slice(&[signature.r8.x, signature.r8.y, signature.s]);
        plaintext.resize(PLAINTEXT_LENGTH, Fr::from(0u64));

        let ciphertext = poseidon_encrypt(&plaintext, shared_key, &Fr::from(0u64))?;
        Message::new(ciphertext)
    }

    /// Decrypts and unpacks a message, failing if the plaintext digest does
    /// not match.
    pub fn decrypt(message: &Message, shared_key: &Fr) -> Result<(VoteCommand, Signature), DomainObjsError> {
        let plaintext =
            poseidon_decrypt(&message.data, shared_key, &Fr::from(0u64), PLAINTEXT_LENGTH)?;
        Ok(Self::unpack(&plaintext))
    }

    /// Decrypts and unpacks a message without checking its digest. A wrong
    /// key yields a command whose signature will not verify.
    pub fn decrypt_without_check(
        message: &Message,
        shared_key: &Fr,
    ) -> Result<(VoteCommand, Signature), DomainObjsError> {
        let plaintext = poseidon_decrypt_without_check(
            &message.data,
            shared_key,
            &Fr::from(0u64),
            PLAINTEXT_LENGTH,
        )?;
        Ok(Self::unpack(&plaintext))
    }

    fn unpack(plaintext: &[Fr]) -> (VoteCommand, Signature) {
        let fields = &plaintext[..SIGNED_LENGTH];
        let packed: BigUint = fields[0].into();

        let command = VoteCommand {
            state_index: extract(&packed, STATE_INDEX_POS),
            new_pub_key: PublicKey::new_unchecked(Point::new_unchecked(fields[1], fields[2])),
            vote_option_index: extract(&packed, VOTE_OPTION_INDEX_POS),
            new_vote_weight: extract(&packed, NEW_VOTE_WEIGHT_POS),
            nonce: extract(&packed, NONCE_POS),
            poll_id: extract(&packed, POLL_ID_POS),
            salt: fields[3],
        };
        let signature = Signature {
            r8: Point::new_unchecked(fields[4], fields[5]),
            s: fields[6],
        };
        (command, signature)
    }

    pub fn to_json_value(&self) -> VoteCommandJson {
        VoteCommandJson {
            state_index: self.state_index.to_string(),
            new_pub_key: self.new_pub_key.serialize(),
            vote_option_index: self.vote_option_index.to_string(),
            new_vote_weight: self.new_vote_weight.to_string(),
            nonce: self.nonce.to_string(),
            poll_id: self.poll_id.to_string(),
            salt: field_to_decimal_string(&self.salt),
        }
    }

    pub fn from_json_value(json: &VoteCommandJson) -> Result<Self, DomainObjsError> {
        let parse = |name: &str, value: &str| {
            value.parse::<u64>().map_err(|e| {
                DomainObjsError::Serialization(format!("Could not deserialize {name} '{value}': {e}"))
            })
        };
        VoteCommand::new(
            parse("state index", &json.state_index)?,
            PublicKey::deserialize(&json.new_pub_key)?,
            parse("vote option index", &json.vote_option_index)?,
            parse("new vote weight", &json.new_vote_weight)?,
            parse("nonce", &json.nonce)?,
            parse("poll id", &json.poll_id)?,
            decimal_to_field(&json.salt)?,
        )
    }

    pub fn to_json(&self) -> Result<String, DomainObjsError> {
        Ok(serde_json::to_string(&self.to_json_value())?)
    }

    pub fn from_json(json: &str) -> Result<Self, DomainObjsError> {
        let parsed: VoteCommandJson = serde_json::from_str(json)?;
        Self::from_json_value(&parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::Keypair;
    use proptest::prelude::*;
    use rand::thread_rng;
    use rand_chacha::rand_core::SeedableRng;

    const MAX_PACKED: u64 = (1 << PACKED_FIELD_BITS) - 1;

    fn command(keypair: &Keypair) -> VoteCommand {
        VoteCommand::new(10, keypair.pub_key, 0, 9, 1, 123, Fr::from(98765u64)).unwrap()
    }

    #[test]
    fn test_field_limits() {
        let mut rng = thread_rng();
        let keypair = Keypair::random(&mut rng);
        let salt = Fr::from(1u64);
        assert!(VoteCommand::new(0, keypair.pub_key, 0, 0, 0, 1 << 50, salt).is_err());
        assert!(VoteCommand::new(1 << 50, keypair.pub_key, 0, 0, 0, 0, salt).is_err());
        let max = VoteCommand::new(
            MAX_PACKED, keypair.pub_key, MAX_PACKED, MAX_PACKED, MAX_PACKED, MAX_PACKED, salt,
        )
        .unwrap();
        let expected = (BigUint::from(1u8) << 250usize) - 1u8;
        assert_eq!(max.packed(), Fr::from(expected));
    }

    #[test]
    fn test_packing_layout() {
        let keypair = Keypair::random(&mut thread_rng());
        let cmd = VoteCommand::new(1, keypair.pub_key, 2, 3, 4, 5, Fr::from(0u64)).unwrap();
        let expected = BigUint::from(1u8)
            + (BigUint::from(2u8) << 50usize)
            + (BigUint::from(3u8) << 100usize)
            + (BigUint::from(4u8) << 150usize)
            + (BigUint::from(5u8) << 200usize);
        assert_eq!(cmd.packed(), Fr::from(expected));
        assert_eq!(cmd.as_array()[1], keypair.pub_key.x());
    }

    #[test]
    fn test_sign_encrypt_decrypt() {
        let mut rng = thread_rng();
        let voter = Keypair::random(&mut rng);
        let coordinator = Keypair::random(&mut rng);
        let ephemeral = Keypair::random(&mut rng);

        let cmd = command(&voter);
        let signature = cmd.sign(&voter.priv_key).unwrap();
        assert!(cmd.verify_signature(&signature, &voter.pub_key));
        assert!(!cmd.verify_signature(&signature, &coordinator.pub_key));

        let shared = Keypair::gen_ecdh_shared_key(&ephemeral.priv_key, &coordinator.pub_key).unwrap();
        let message = cmd.encrypt(&signature, &shared).unwrap();
        assert_eq!(message.data.len(), 10);

        let shared_back = Keypair::gen_ecdh_shared_key(&coordinator.priv_key, &ephemeral.pub_key).unwrap();
        let (decrypted, decrypted_sig) = VoteCommand::decrypt(&message, &shared_back).unwrap();
        assert_eq!(decrypted, cmd);
        assert_eq!(decrypted_sig, signature);
        assert!(decrypted.verify_signature(&decrypted_sig, &voter.pub_key));
    }

    #[test]
    fn test_wrong_key_decryption() {
        let mut rng = thread_rng();
        let voter = Keypair::random(&mut rng);
        let cmd = command(&voter);
        let signature = cmd.sign(&voter.priv_key).unwrap();
        let message = cmd.encrypt(&signature, &Fr::from(5u64)).unwrap();

        assert!(VoteCommand::decrypt(&message, &Fr::from(6u64)).is_err());
        let (garbage, garbage_sig) = VoteCommand::decrypt_without_check(&message, &Fr::from(6u64)).unwrap();
        assert!(garbage.state_index <= MAX_PACKED);
        assert!(!garbage.verify_signature(&garbage_sig, &voter.pub_key));
    }

    #[test]
    fn test_json_round_trip() {
        let voter = Keypair::random(&mut thread_rng());
        let cmd = command(&voter);
        let json = cmd.to_json().unwrap();
        assert!(json.contains("\"stateIndex\":\"10\""));
        assert_eq!(VoteCommand::from_json(&json).unwrap(), cmd);

        let mut value = cmd.to_json_value();
        value.poll_id = (1u64 << 50).to_string();
        assert!(VoteCommand::from_json_value(&value).is_err());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn prop_codec_round_trip(
            seed in any::<[u8; 32]>(),
            state_index in 0..=MAX_PACKED,
            vote_option_index in 0..=MAX_PACKED,
            new_vote_weight in 0..=MAX_PACKED,
            nonce in 0..=MAX_PACKED,
            poll_id in 0..=MAX_PACKED,
        ) {
            let mut rng = rand_chacha::ChaCha8Rng::from_seed(seed);
            let voter = Keypair::random(&mut rng);
            let cmd = VoteCommand::with_random_salt(
                &mut rng, state_index, voter.pub_key, vote_option_index, new_vote_weight, nonce, poll_id,
            ).unwrap();
            let signature = cmd.sign(&voter.priv_key).unwrap();
            let key = Fr::from(42u64);
            let message = cmd.encrypt(&signature, &key).unwrap();
            let (decoded, decoded_sig) = VoteCommand::decrypt(&message, &key).unwrap();
            prop_assert_eq!(decoded, cmd);
            prop_assert_eq!(decoded_sig, signature);
        }
    }
}
