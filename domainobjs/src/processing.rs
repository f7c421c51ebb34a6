//! Coordinator side decoding of published messages.

use maci_crypto::eddsa::Signature;
use rayon::prelude::*;
use tracing::{debug, warn};

use crate::commands::{Message, VoteCommand};
use crate::error::DomainObjsError;
use crate::keys::{Keypair, PrivateKey, PublicKey};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageStatus {
    /// The plaintext digest matched.
    Authentic,
    /// The digest did not match; the command was decoded without the check
    /// and will not carry a valid signature.
    Tampered,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecryptedMessage {
    pub command: VoteCommand,
    pub signature: Signature,
    pub status: MessageStatus,
}

impl DecryptedMessage {
    /// Whether the command decrypted cleanly and was signed by `pub_key`.
    pub fn is_valid_for(&self, pub_key: &PublicKey) -> bool {
        self.status == MessageStatus::Authentic
            && self.command.verify_signature(&self.signature, pub_key)
    }
}

/// Decodes one message sent under the ephemeral `enc_pub_key`.
pub fn decrypt_message(
    coordinator_key: &PrivateKey,
    message: &Message,
    enc_pub_key: &PublicKey,
) -> Result<DecryptedMessage, DomainObjsError> {
    let shared_key = Keypair::gen_ecdh_shared_key(coordinator_key, enc_pub_key)?;
    match VoteCommand::decrypt(message, &shared_key) {
        Ok((command, signature)) => Ok(DecryptedMessage {
            command,
            signature,
            status: MessageStatus::Authentic,
        }),
        Err(err) => {
            warn!(error = %err, "message failed the integrity check, decoding without it");
            let (command, signature) = VoteCommand::decrypt_without_check(message, &shared_key)?;
            Ok(DecryptedMessage {
                command,
                signature,
                status: MessageStatus::Tampered,
            })
        }
    }
}

/// Decodes a batch of messages in parallel. Each entry succeeds or fails on
/// its own, in the order of `batch`.
pub fn decrypt_messages(
    coordinator_key: &PrivateKey,
    batch: &[(Message, PublicKey)],
) -> Vec<Result<DecryptedMessage, DomainObjsError>> {
    debug!(messages = batch.len(), "decrypting message batch");
    batch
        .par_iter()
        .map(|(message, enc_pub_key)| decrypt_message(coordinator_key, message, enc_pub_key))
        .collect()
}
