pub mod message;
pub mod vote_command;

pub use message::{Message, MESSAGE_LENGTH};
pub use vote_command::VoteCommand;
