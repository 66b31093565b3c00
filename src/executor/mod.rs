//! Worker RPC client.
//!
//! The worker daemon itself is treated as a remote executor reached over
//! HTTP: dispatch is fire-and-forget, with terminal status reported back
//! later through a separate callback rather than this call's return value.
//! A failed dispatch RPC reverts the command to READY rather than retrying
//! in place; the next assignment tick picks it back up.

pub mod client;

pub use client::{DispatchRequest, HttpWorkerClient, WorkerClient};
