//! CA and CLM API clients and the metadata sync engine.
//!
//! - [`CaClient`] talks to the CA order-management API (API key header)
//! - [`ClmClient`] talks to the CLM REST API (HTTP Basic)
//! - [`SyncEngine`] drives a run against any [`CaApi`] / [`ClmApi`] pair
//!
//! Every remote call is retried with exponential backoff and jitter through
//! [`RetryPolicy`].

pub mod api;
pub mod auth;
pub mod ca;
pub mod ca_models;
pub mod clm;
pub mod clm_models;
pub mod error;
mod http;
pub mod retry;
pub mod sync;

pub use api::{CaApi, ClmApi};
pub use auth::Credentials;
pub use ca::{CaClient, DEFAULT_CA_BASE_URL};
pub use clm::ClmClient;
pub use error::{ClientError, ClientResult, Disposition, SyncError, SyncResult};
pub use retry::RetryPolicy;
pub use sync::{SyncEngine, SyncMode, SyncSettings, SyncSummary};
