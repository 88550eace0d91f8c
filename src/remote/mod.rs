//! Scanner Service Boundary
//!
//! Everything the run needs from the remote scanner, behind the
//! [`ScanService`] trait:
//!
//! - **RemoteServiceClient**: `reqwest` client for the `api/v1/` REST endpoints
//! - **InMemoryScanService**: scriptable in-process scanner
//! - **Wire types**: request/response bodies, scan speed, criticality, profiles

pub mod client;
pub mod error;
pub mod memory;
pub mod profiles;
pub mod traits;
pub mod types;

pub use client::RemoteServiceClient;
pub use error::{RemoteError, RemoteResult};
pub use memory::{InMemoryScanService, ServiceCall};
pub use traits::ScanService;
