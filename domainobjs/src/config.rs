use serde::{Deserialize, Serialize};

use crate::ballot::{vote_option_capacity, MAX_VOTE_OPTION_TREE_DEPTH};
use crate::error::DomainObjsError;

const MAX_STATE_TREE_DEPTH: usize = 32;
const MAX_MESSAGE_TREE_DEPTH: usize = 32;

/// Tree depths of a poll.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TreeDepths {
    pub state_tree_depth: usize,
    pub vote_option_tree_depth: usize,
    pub message_tree_depth: usize,
}

impl Default for TreeDepths {
    fn default() -> Self {
        TreeDepths {
            state_tree_depth: 10,
            vote_option_tree_depth: 2,
            message_tree_depth: 10,
        }
    }
}

fn check_depth(name: &str, depth: usize, max: usize) -> Result<(), DomainObjsError> {
    if depth == 0 || depth > max {
        return Err(DomainObjsError::Validation(format!(
            "{name} must be between 1 and {max}, got {depth}"
        )));
    }
    Ok(())
}

impl TreeDepths {
    pub fn validate(&self) -> Result<(), DomainObjsError> {
        check_depth("state tree depth", self.state_tree_depth, MAX_STATE_TREE_DEPTH)?;
        check_depth(
            "vote option tree depth",
            self.vote_option_tree_depth,
            MAX_VOTE_OPTION_TREE_DEPTH,
        )?;
        check_depth("message tree depth", self.message_tree_depth, MAX_MESSAGE_TREE_DEPTH)?;
        Ok(())
    }

    /// Number of vote options a ballot can hold.
    pub fn max_vote_options(&self) -> Result<usize, DomainObjsError> {
        vote_option_capacity(self.vote_option_tree_depth)
    }

    pub fn from_json(json: &str) -> Result<Self, DomainObjsError> {
        let depths: TreeDepths = serde_json::from_str(json)?;
        depths.validate()?;
        Ok(depths)
    }

    pub fn to_json(&self) -> Result<String, DomainObjsError> {
        Ok(serde_json::to_string(self)?)
    }
}
