//! Chain Reader
//!
//! Read-only access to a Solana node:
//! - Account lookups
//! - Balances and slot height
//! - Latest blockhash and latest block
//! - Cluster identification
//! - Fee estimation for serialized messages
//!
//! [`RpcReader`] implements [`Reader`] over JSON-RPC, and [`SourcePoller`]
//! turns any reader into a stream of slot or blockhash updates.
pub mod client;
pub mod config;
pub mod error;
pub mod poller;
pub mod reader;
pub mod sources;
pub mod testing;
pub mod types;

pub use client::RpcReader;
pub use config::{PollerConfig, ReaderConfig};
pub use error::{ReaderError, ReaderResult};
pub use poller::{PollerHandle, Source, SourcePoller};
pub use reader::{AccountReader, Reader};
pub use sources::{BlockhashSource, SlotSource};
pub use types::*;
