//! Async client for the Analos launchpad.
//!
//! A [`Connection`] is built once from a [`ClientConfig`]; it owns the
//! JSON-RPC client and records whether the pubsub endpoint answered. A
//! [`Submitter`] borrows the connection to assemble, sign and confirm
//! transactions built by `launchpad-core`. Collection records created along
//! the way can be cached in a [`FallbackStore`].

pub mod config;
pub mod connection;
pub mod error;
pub mod keystore;
pub mod rpc;
pub mod store;
pub mod submit;
pub mod wallet;

pub use config::{ClientConfig, Commitment, StoreConfig};
pub use connection::{probe_transport, Connection, PushProbe, TransportMode, WebSocketProbe};
pub use error::ClientError;
pub use keystore::{decrypt_keypair, encrypt_keypair, EncryptedKeypair, KdfParams};
pub use rpc::{AccountInfo, LatestBlockhash, RpcClient, SignatureStatus, TokenAccountBalance};
pub use store::{
    CollectionRecord, FallbackStore, HttpBackend, LocalFileBackend, MetadataBackend, SaveReport,
};
pub use submit::{Outcome, SubmissionState, Submitter};
pub use wallet::{sign_with, KeypairWallet, Wallet};
