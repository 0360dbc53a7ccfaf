//! Remote editing session support: the session service contract, its HTTP
//! and in-memory implementations, and the adapter that keeps a local editor
//! in step with the authoritative session state.

pub mod adapter;
pub mod config;
pub mod error;
pub mod http;
pub mod local;
pub mod service;
pub mod wire;

pub use adapter::{CommitPolicy, SessionSync};
pub use config::SessionConfig;
pub use error::{Result, SyncError};
pub use http::HttpSessionService;
pub use local::LocalSessionService;
pub use service::SessionService;
