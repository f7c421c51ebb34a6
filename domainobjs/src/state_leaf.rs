use maci_crypto::hashing::hash3;
use maci_crypto::Fr;
use rand::Rng;

use crate::error::DomainObjsError;
use crate::keys::{Keypair, PublicKey};
use crate::serde_types::{
    decimal_to_field, field_to_decimal_string, StateLeafContractParam, StateLeafJson,
};

/// A registered voter: their current public key and voice credit balance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StateLeaf {
    pub pub_key: PublicKey,
    pub voice_credit_balance: Fr,
}

impl StateLeaf {
    pub fn new(pub_key: PublicKey, voice_credit_balance: Fr) -> Self {
        StateLeaf { pub_key, voice_credit_balance }
    }

    /// Leaf that fills unused slots of the state tree.
    pub fn gen_blank_leaf() -> Self {
        StateLeaf::new(PublicKey::padding_key(), Fr::from(0u64))
    }

    pub fn gen_random_leaf<R: Rng>(rng: &mut R) -> Self {
        let keypair = Keypair::random(rng);
        StateLeaf::new(keypair.pub_key, Fr::from(rng.gen_range(0..1_000_000_000u64)))
    }

    pub fn as_array(&self) -> [Fr; 3] {
        [self.pub_key.x(), self.pub_key.y(), self.voice_credit_balance]
    }

    pub fn hash(&self) -> Result<Fr, DomainObjsError> {
        Ok(hash3(&self.as_array())?)
    }

    pub fn as_contract_param(&self) -> StateLeafContractParam {
        StateLeafContractParam {
            pub_key: self.pub_key.as_contract_param(),
            voice_credit_balance: field_to_decimal_string(&self.voice_credit_balance),
        }
    }

    pub fn to_json_value(&self) -> StateLeafJson {
        StateLeafJson {
            pub_key: self.pub_key.serialize(),
            voice_credit_balance: field_to_decimal_string(&self.voice_credit_balance),
        }
    }

    pub fn from_json_value(json: &StateLeafJson) -> Result<Self, DomainObjsError> {
        Ok(StateLeaf::new(
            PublicKey::deserialize(&json.pub_key)?,
            decimal_to_field(&json.voice_credit_balance)?,
        ))
    }

    pub fn to_json(&self) -> Result<String, DomainObjsError> {
        Ok(serde_json::to_string(&self.to_json_value())?)
    }

    pub fn from_json(json: &str) -> Result<Self, DomainObjsError> {
        let parsed: StateLeafJson = serde_json::from_str(json)?;
        Self::from_json_value(&parsed)
    }
}
