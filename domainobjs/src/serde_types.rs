use ark_ff::PrimeField;
use maci_crypto::utils::{field_from_decimal, field_to_decimal};
use serde::{Deserialize, Serialize};

use crate::error::DomainObjsError;

pub fn decimal_to_field<F: PrimeField>(value: &str) -> Result<F, DomainObjsError> {
    field_from_decimal(value)
        .map_err(|e| DomainObjsError::Serialization(format!("Could not deserialize field element: {e}")))
}

pub fn field_to_decimal_string<F: PrimeField>(value: &F) -> String {
    field_to_decimal(value)
}

pub fn decimals_to_fields<F: PrimeField>(values: &[String]) -> Result<Vec<F>, DomainObjsError> {
    values.iter().map(|v| decimal_to_field(v)).collect()
}

pub fn fields_to_decimal_strings<F: PrimeField>(values: &[F]) -> Vec<String> {
    values.iter().map(field_to_decimal_string).collect()
}

/// Parses a hex string that may have an odd number of digits.
pub fn decode_hex_padded(value: &str) -> Result<Vec<u8>, DomainObjsError> {
    let padded = if value.len() % 2 == 1 {
        format!("0{value}")
    } else {
        value.to_string()
    };
    hex::decode(padded).map_err(|e| DomainObjsError::Serialization(format!("Invalid hex: {e}")))
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VoteCommandJson {
    pub state_index: String,
    pub new_pub_key: String,
    pub vote_option_index: String,
    pub new_vote_weight: String,
    pub nonce: String,
    pub poll_id: String,
    pub salt: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct MessageJson {
    pub data: Vec<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StateLeafJson {
    pub pub_key: String,
    pub voice_credit_balance: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BallotJson {
    pub votes: Vec<String>,
    pub nonce: String,
    pub vote_option_tree_depth: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VoteCountsJson {
    pub counts: Vec<String>,
    pub nonce: String,
    pub vote_option_tree_depth: String,
}

/// Public key as the contracts take it.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct PubKeyContractParam {
    pub x: String,
    pub y: String,
}

/// State leaf as the contracts take it.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StateLeafContractParam {
    pub pub_key: PubKeyContractParam,
    pub voice_credit_balance: String,
}
