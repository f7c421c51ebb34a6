use ark_ff::Zero;
use maci_crypto::hashing::hash_left_right;
use maci_crypto::Fr;
use rand::Rng;

use crate::ballot::{check_vote_options, parse_depth, vote_option_root};
use crate::error::DomainObjsError;
use crate::serde_types::{
    decimal_to_field, decimals_to_fields, field_to_decimal_string, fields_to_decimal_strings,
    VoteCountsJson,
};

/// Running totals per vote option.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VoteCounts {
    pub counts: Vec<Fr>,
    pub nonce: Fr,
    pub vote_option_tree_depth: usize,
}

impl VoteCounts {
    pub fn new(num_vote_options: usize, vote_option_tree_depth: usize) -> Result<Self, DomainObjsError> {
        check_vote_options(num_vote_options, vote_option_tree_depth)?;
        Ok(VoteCounts {
            counts: vec![Fr::zero(); num_vote_options],
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
        let mut vote_counts = Self::new(num_vote_options, vote_option_tree_depth)?;
        for count in vote_counts.counts.iter_mut() {
            *count = Fr::from(rng.gen_range(0..1_000_000u64));
        }
        vote_counts.nonce = Fr::from(rng.gen_range(0..1_000u64));
        Ok(vote_counts)
    }

    pub fn as_array(&self) -> Result<[Fr; 2], DomainObjsError> {
        let root = vote_option_root(&self.counts, self.vote_option_tree_depth)?;
        Ok([self.nonce, root])
    }

    pub fn hash(&self) -> Result<Fr, DomainObjsError> {
        let [nonce, root] = self.as_array()?;
        Ok(hash_left_right(&nonce, &root)?)
    }

    pub fn to_json_value(&self) -> VoteCountsJson {
        VoteCountsJson {
            counts: fields_to_decimal_strings(&self.counts),
            nonce: field_to_decimal_string(&self.nonce),
            vote_option_tree_depth: self.vote_option_tree_depth.to_string(),
        }
    }

    pub fn from_json_value(json: &VoteCountsJson) -> Result<Self, DomainObjsError> {
        let vote_option_tree_depth = parse_depth(&json.vote_option_tree_depth)?;
        let counts = decimals_to_fields(&json.counts)?;
        check_vote_options(counts.len(), vote_option_tree_depth)?;
        Ok(VoteCounts {
            counts,
            nonce: decimal_to_field(&json.nonce)?,
            vote_option_tree_depth,
        })
    }

    pub fn to_json(&self) -> Result<String, DomainObjsError> {
        Ok(serde_json::to_string(&self.to_json_value())?)
    }

    pub fn from_json(json: &str) -> Result<Self, DomainObjsError> {
        let parsed: VoteCountsJson = serde_json::from_str(json)?;
        Self::from_json_value(&parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ballot::Ballot;
    use rand::thread_rng;

    #[test]
    fn test_matches_ballot_semantics() {
        let mut counts = VoteCounts::new(4, 1).unwrap();
        let mut ballot = Ballot::new(4, 1).unwrap();
        counts.counts[2] = Fr::from(11u64);
        ballot.votes[2] = Fr::from(11u64);
        assert_eq!(counts.hash().unwrap(), ballot.hash().unwrap());
        assert!(VoteCounts::new(6, 1).is_err());
    }

    #[test]
    fn test_json_round_trip() {
        let counts = VoteCounts::generate_random(&mut thread_rng(), 20, 2).unwrap();
        let json = counts.to_json().unwrap();
        assert!(json.contains("\"voteOptionTreeDepth\":\"2\""));
        assert_eq!(VoteCounts::from_json(&json).unwrap(), counts);
        assert_eq!(VoteCounts::generate_blank(3, 1).unwrap().counts, vec![Fr::zero(); 3]);
    }
}
