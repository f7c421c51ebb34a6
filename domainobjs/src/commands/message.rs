use maci_crypto::hashing::poseidon;
use maci_crypto::Fr;

use crate::error::DomainObjsError;
use crate::keys::PublicKey;
use crate::serde_types::{decimals_to_fields, fields_to_decimal_strings, MessageJson};

/// Number of field elements in an encrypted command.
pub const MESSAGE_LENGTH: usize = 10;

/// An encrypted vote command as published on chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Message {
    pub data: [Fr; MESSAGE_LENGTH],
}

impl Message {
    pub fn new(data: Vec<Fr>) -> Result<Self, DomainObjsError> {
        let data: [Fr; MESSAGE_LENGTH] = data.try_into().map_err(|d: Vec<Fr>| {
            DomainObjsError::Validation(format!(
                "a message has {MESSAGE_LENGTH} elements, got {}",
                d.len()
            ))
        })?;
        Ok(Message { data })
    }

    pub fn as_array(&self) -> [Fr; MESSAGE_LENGTH] {
        self.data
    }

    /// Leaf of the message tree: the message data followed by the ephemeral
    /// public key it was encrypted with.
    pub fn hash(&self, enc_pub_key: &PublicKey) -> Result<Fr, DomainObjsError> {
        let mut inputs = self.data.to_vec();
        inputs.extend_from_slice(&enc_pub_key.as_array());
        Ok(poseidon(&inputs)?)
    }

    pub fn as_contract_param(&self) -> MessageJson {
        MessageJson {
            data: fields_to_decimal_strings(&self.data),
        }
    }

    pub fn from_json_value(json: &MessageJson) -> Result<Self, DomainObjsError> {
        Message::new(decimals_to_fields(&json.data)?)
    }

    pub fn to_json(&self) -> Result<String, DomainObjsError> {
        Ok(serde_json::to_string(&self.as_contract_param())?)
    }

    pub fn from_json(json: &str) -> Result<Self, DomainObjsError> {
        let parsed: MessageJson = serde_json::from_str(json)?;
        Self::from_json_value(&parsed)
    }
}
