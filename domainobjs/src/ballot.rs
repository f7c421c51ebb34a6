use ark_ff::Zero;
use maci_crypto::hashing::hash_left_right;
use maci_crypto::tree::{calc_root, Arity, IncrementalQuinTree};
use maci_crypto::Fr;
use rand::Rng;

use crate::error::DomainObjsError;
use crate::serde_types::{
    decimal_to_field, decimals_to_fields, field_to_decimal_string, fields_to_decimal_strings, BallotJson,
};

/// Deepest vote option tree the contracts pre-register an empty root for.
pub const MAX_VOTE_OPTION_TREE_DEPTH: usize = 5;

/// Number of vote options a quinary tree of the given depth holds.
pub fn vote_option_capacity(depth: usize) -> Result<usize, DomainObjsError> {
    u32::try_from(depth)
        .ok()
        .and_then(|d| 5usize.checked_pow(d))
        .ok_or_else(|| DomainObjsError::Validation(format!("vote option tree depth {depth} is too large")))
}

pub(crate) fn check_vote_options(count: usize, depth: usize) -> Result<(), DomainObjsError> {
    let capacity = vote_option_capacity(depth)?;
    if count > capacity {
        return Err(DomainObjsError::Validation(format!(
            "{count} vote options do not fit a tree of depth {depth} ({capacity} leaves)"
        )));
    }
    Ok(())
}

/// Root of the quinary vote option tree holding `values` up to the last
/// non-zero entry.
pub(crate) fn vote_option_root(values: &[Fr], depth: usize) -> Result<Fr, DomainObjsError> {
    let used = values
        .iter()
        .rposition(|v| !v.is_zero())
        .map_or(0, |last| last + 1);
    Ok(calc_root(depth, Fr::zero(), Arity::Quinary, &values[..used])?)
}

pub(crate) fn parse_depth(value: &str) -> Result<usize, DomainObjsError> {
    value
        .parse::<usize>()
        .map_err(|e| DomainObjsError::Serialization(format!("Invalid vote option tree depth '{value}': {e}")))
}

/// A voter's votes per option, committed to by the tally circuits.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ballot {
    pub votes: Vec<Fr>,
    pub nonce: Fr,
    pub vote_option_tree_depth: usize,
}

impl Ballot {
    pub fn new(num_vote_options: usize, vote_option_tree_depth: usize) -> Result<Self, DomainObjsError> {
        check_vote_options(num_vote_options, vote_option_tree_depth)?;
        Ok(Ballot {
            votes: vec![Fr::zero(); num_vote_options],
            nonce: Fr::zero(),
            vote_option_tree_depth,
        })
    }

    pub fn generate_blank(num_vote_options: usize, vote_option_tree_depth: usize) -> Result<Self, DomainObjsError> {
        Self::new(num_vote_options, vote_option_tree_depth)
    }

    pub fn generate_random<R: Rng>(
        rng: &mut R,
        num_vote_options: usize,
        vote_option_tree_depth: usize,
    ) -> Result<Self, DomainObjsError> {
        let mut ballot = Self::new(num_vote_options, vote_option_tree_depth)?;
        for vote in ballot.votes.iter_mut() {
            *vote = Fr::from(rng.gen_range(0..1_000_000u64));
        }
        ballot.nonce = Fr::from(rng.gen_range(0..1_000u64));
        Ok(ballot)
    }

    /// `[nonce, vote option root]`
    pub fn as_array(&self) -> Result<[Fr; 2], DomainObjsError> {
        let root = vote_option_root(&self.votes, self.vote_option_tree_depth)?;
        Ok([self.nonce, root])
    }

    pub fn hash(&self) -> Result<Fr, DomainObjsError> {
        let [nonce, root] = self.as_array()?;
        Ok(hash_left_right(&nonce, &root)?)
    }

    pub fn to_json_value(&self) -> BallotJson {
        BallotJson {
            votes: fields_to_decimal_strings(&self.votes),
            nonce: field_to_decimal_string(&self.nonce),
            vote_option_tree_depth: self.vote_option_tree_depth.to_string(),
        }
    }

    pub fn from_json_value(json: &BallotJson) -> Result<Self, DomainObjsError> {
        let vote_option_tree_depth = parse_depth(&json.vote_option_tree_depth)?;
        let votes = decimals_to_fields(&json.votes)?;
        check_vote_options(votes.len(), vote_option_tree_depth)?;
        Ok(Ballot {
            votes,
            nonce: decimal_to_field(&json.nonce)?,
            vote_option_tree_depth,
        })
    }

    pub fn to_json(&self) -> Result<String, DomainObjsError> {
        Ok(serde_json::to_string(&self.to_json_value())?)
    }

    pub fn from_json(json: &str) -> Result<Self, DomainObjsError> {
        let parsed: BallotJson = serde_json::from_str(json)?;
        Self::from_json_value(&parsed)
    }
}

/// Roots of an empty state-depth ballot tree, one per vote option tree depth
/// from 1 to 5. The contracts store these so that polls start from a known
/// ballot root.
pub fn empty_ballot_roots(state_tree_depth: usize) -> Result<Vec<Fr>, DomainObjsError> {
    (1..=MAX_VOTE_OPTION_TREE_DEPTH)
        .map(|depth| -> Result<Fr, DomainObjsError> {
            let blank = Ballot::new(0, depth)?.hash()?;
            let tree = IncrementalQuinTree::new(state_tree_depth, blank, Arity::Quinary)?;
            Ok(tree.root())
        })
        .collect()
}
