//! Transaction assembly, submission and confirmation polling.
//!
//! Lifecycle: `Built -> Signed -> Pending -> Confirmed | TimedOut |
//! RejectedOnChain`. Nothing here retries a submission. Transient errors
//! while polling are logged and polling continues until the deadline.

use std::fmt;
use std::time::Duration;

use chain_analos::{Address, Instruction, Signature, SignedTransaction, SigningKey, UnsignedTransaction};
use launchpad_core::Network;
use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::{ClientConfig, Commitment};
use crate::connection::Connection;
use crate::error::ClientError;
use crate::rpc::{LatestBlockhash, SignatureStatus, SEND_TRANSACTION_PREFLIGHT_FAILURE};
use crate::wallet::{sign_with, Wallet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionState {
    Built,
    Signed,
    Pending,
    Confirmed,
    TimedOut,
    RejectedOnChain,
}

impl SubmissionState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            SubmissionState::Confirmed | SubmissionState::TimedOut | SubmissionState::RejectedOnChain
        )
    }

    /// Legal edges of the lifecycle. Preflight rejection goes straight from
    /// `Signed` to `RejectedOnChain`.
    pub fn can_transition_to(self, next: SubmissionState) -> bool {
        use SubmissionState::*;
        matches!(
            (self, next),
            (Built, Signed)
                | (Signed, Pending)
                | (Signed, RejectedOnChain)
                | (Pending, Confirmed)
                | (Pending, TimedOut)
                | (Pending, RejectedOnChain)
        )
    }
}

impl fmt::Display for SubmissionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SubmissionState::Built => "built",
            SubmissionState::Signed => "signed",
            SubmissionState::Pending => "pending",
            SubmissionState::Confirmed => "confirmed",
            SubmissionState::TimedOut => "timed_out",
            SubmissionState::RejectedOnChain => "rejected_on_chain",
        };
        f.write_str(s)
    }
}

/// Terminal result of a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Confirmed { signature: Signature, slot: u64 },
    /// Unknown outcome: the transaction may still land. Check the explorer.
    TimedOut { signature: Signature },
    /// Failed in preflight simulation or on chain. `error` is the node's text.
    RejectedOnChain { signature: Signature, error: String },
}

impl Outcome {
    pub fn signature(&self) -> &Signature {
        match self {
            Outcome::Confirmed { signature, .. }
            | Outcome::TimedOut { signature }
            | Outcome::RejectedOnChain { signature, .. } => signature,
        }
    }

    pub fn state(&self) -> SubmissionState {
        match self {
            Outcome::Confirmed { .. } => SubmissionState::Confirmed,
            Outcome::TimedOut { .. } => SubmissionState::TimedOut,
            Outcome::RejectedOnChain { .. } => SubmissionState::RejectedOnChain,
        }
    }

    pub fn is_confirmed(&self) -> bool {
        matches!(self, Outcome::Confirmed { .. })
    }

    pub fn explorer_url(&self, network: Network) -> String {
        network.explorer_tx_url(self.signature())
    }
}

/// Drives transactions through the lifecycle over one [`Connection`].
#[derive(Debug)]
pub struct Submitter<'a> {
    conn: &'a Connection,
    commitment: Commitment,
    confirm_timeout: Duration,
    poll_interval: Duration,
}

impl<'a> Submitter<'a> {
    pub fn new(conn: &'a Connection, config: &ClientConfig) -> Self {
        Self {
            conn,
            commitment: config.commitment,
            confirm_timeout: config.confirm_timeout(),
            poll_interval: config.poll_interval(),
        }
    }

    pub fn with_timing(mut self, confirm_timeout: Duration, poll_interval: Duration) -> Self {
        self.confirm_timeout = confirm_timeout;
        self.poll_interval = poll_interval;
        self
    }

    /// Fetch a fresh blockhash and compile `instructions` into a message.
    pub async fn assemble(
        &self,
        instructions: &[Instruction],
        fee_payer: &Address,
    ) -> Result<(UnsignedTransaction, LatestBlockhash), ClientError> {
        let latest = self.conn.rpc().get_latest_blockhash().await?;
        let tx = UnsignedTransaction::new(instructions, fee_payer, &latest.blockhash)?;
        info!(
            state = %SubmissionState::Built,
            fee_payer = %fee_payer,
            instructions = instructions.len(),
            signers = tx.required_signers().len(),
            "transaction assembled"
        );
        Ok((tx, latest))
    }

    pub async fn submit(
        &self,
        instructions: &[Instruction],
        wallet: &dyn Wallet,
    ) -> Result<Outcome, ClientError> {
        self.submit_with_signers(instructions, wallet, &[]).await
    }

    /// Assemble, sign, send and confirm. `co_signers` sign for required
    /// signers other than the wallet (freshly generated mints).
    ///
    /// `Err` means the transaction never reached the node. Once it has,
    /// every result is an [`Outcome`].
    pub async fn submit_with_signers(
        &self,
        instructions: &[Instruction],
        wallet: &dyn Wallet,
        co_signers: &[&SigningKey],
    ) -> Result<Outcome, ClientError> {
        let fee_payer = wallet.public_key().ok_or(ClientError::WalletNotConnected)?;
        let (unsigned, latest) = self.assemble(instructions, &fee_payer).await?;

        let signed = sign_with(wallet, unsigned, co_signers).await?;
        info!(
            state = %SubmissionState::Signed,
            signature = %signed.signature(),
            "transaction signed"
        );

        self.send_and_confirm(&signed, Some(latest.last_valid_block_height))
            .await
    }

    /// Send a signed transaction and wait for its outcome.
    pub async fn send_and_confirm(
        &self,
        tx: &SignedTransaction,
        last_valid_block_height: Option<u64>,
    ) -> Result<Outcome, ClientError> {
        let signature = tx.signature();
        match self.conn.rpc().send_transaction(tx).await {
            Ok(returned) => {
                if returned != signature {
                    warn!(expected = %signature, returned = %returned, "node returned a different signature");
                }
            }
            Err(ClientError::Rpc { code, message }) if code == SEND_TRANSACTION_PREFLIGHT_FAILURE => {
                warn!(
                    state = %SubmissionState::RejectedOnChain,
                    signature = %signature,
                    error = %message,
                    "preflight simulation failed"
                );
                return Ok(Outcome::RejectedOnChain {
                    signature,
                    error: message,
                });
            }
            Err(e) => return Err(e),
        }

        info!(
            state = %SubmissionState::Pending,
            signature = %signature,
            explorer = %self.conn.network().explorer_tx_url(&signature),
            "transaction sent"
        );
        Ok(self.confirm(signature, last_valid_block_height).await)
    }

    /// Poll `getSignatureStatuses` until the configured commitment is
    /// reached, the transaction fails, its blockhash expires or
    /// `confirm_timeout` elapses.
    ///
    /// Every RPC call made while polling is cut off at the deadline, so a
    /// slow node cannot stretch the wait past `confirm_timeout`.
    pub async fn confirm(&self, signature: Signature, last_valid_block_height: Option<u64>) -> Outcome {
        let deadline = Instant::now() + self.confirm_timeout;
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            let polled = match tokio::time::timeout_at(deadline, self.status(&signature)).await {
                Ok(polled) => polled,
                Err(_) => Err(ClientError::Network(
                    "getSignatureStatuses: no answer before the confirmation deadline".into(),
                )),
            };
            match polled {
                Ok(Some(status)) => {
                    if let Some(err) = status.err {
                        let error = err.to_string();
                        warn!(
                            state = %SubmissionState::RejectedOnChain,
                            signature = %signature,
                            slot = status.slot,
                            error = %error,
                            "transaction failed on chain"
                        );
                        return Outcome::RejectedOnChain { signature, error };
                    }
                    let reached = status
                        .confirmation_status
                        .as_deref()
                        .is_some_and(|s| self.commitment.is_satisfied_by(s));
                    if reached {
                        info!(
                            state = %SubmissionState::Confirmed,
                            signature = %signature,
                            slot = status.slot,
                            attempts = attempt,
                            "transaction confirmed"
                        );
                        return Outcome::Confirmed {
                            signature,
                            slot: status.slot,
                        };
                    }
                    debug!(signature = %signature, status = ?status.confirmation_status, "not yet at commitment");
                }
                Ok(None) => {
                    if self.blockhash_expired(last_valid_block_height, deadline).await {
                        warn!(
                            state = %SubmissionState::TimedOut,
                            signature = %signature,
                            "blockhash expired before the transaction was seen"
                        );
                        return Outcome::TimedOut { signature };
                    }
                    debug!(signature = %signature, attempt, "signature not found yet");
                }
                Err(e) => {
                    warn!(signature = %signature, attempt, error = %e, "status poll failed, will retry");
                }
            }

            let now = Instant::now();
            if now >= deadline {
                warn!(
                    state = %SubmissionState::TimedOut,
                    signature = %signature,
                    timeout_ms = self.confirm_timeout.as_millis() as u64,
                    "confirmation timed out"
                );
                return Outcome::TimedOut { signature };
            }
            tokio::time::sleep(self.poll_interval.min(deadline - now)).await;
        }
    }

    /// Current status of one signature.
    pub async fn status(&self, signature: &Signature) -> Result<Option<SignatureStatus>, ClientError> {
        let mut statuses = self
            .conn
            .rpc()
            .get_signature_statuses(std::slice::from_ref(signature))
            .await?;
        Ok(statuses.pop().flatten())
    }

    async fn blockhash_expired(&self, last_valid_block_height: Option<u64>, deadline: Instant) -> bool {
        let Some(last_valid) = last_valid_block_height else {
            return false;
        };
        match tokio::time::timeout_at(deadline, self.conn.rpc().get_block_height()).await {
            Ok(Ok(height)) => height > last_valid,
            Ok(Err(e)) => {
                debug!(error = %e, "block height unavailable");
                false
            }
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_edges() {
        use SubmissionState::*;
        assert!(Built.can_transition_to(Signed));
        assert!(Signed.can_transition_to(Pending));
        assert!(Signed.can_transition_to(RejectedOnChain));
        assert!(Pending.can_transition_to(Confirmed));
        assert!(Pending.can_transition_to(TimedOut));
        assert!(!Built.can_transition_to(Pending));
        assert!(!Confirmed.can_transition_to(Pending));
        assert!(!TimedOut.can_transition_to(Confirmed));
        assert!(!Signed.can_transition_to(TimedOut));
    }

    #[test]
    fn terminal_states() {
        use SubmissionState::*;
        for s in [Confirmed, TimedOut, RejectedOnChain] {
            assert!(s.is_terminal());
        }
        for s in [Built, Signed, Pending] {
            assert!(!s.is_terminal());
        }
    }

    #[test]
    fn outcome_accessors_and_json() {
        let sig = Signature::new([1; 64]);
        let outcome = Outcome::TimedOut { signature: sig };
        assert_eq!(outcome.state(), SubmissionState::TimedOut);
        assert!(!outcome.is_confirmed());
        assert!(outcome
            .explorer_url(Network::Devnet)
            .ends_with(&format!("/tx/{sig}?cluster=devnet")));

        let json = serde_json::to_value(Outcome::Confirmed { signature: sig, slot: 9 }).unwrap();
        assert_eq!(json["status"], "confirmed");
        assert_eq!(json["slot"], 9);
        assert_eq!(json["signature"], sig.to_string());
    }
}
