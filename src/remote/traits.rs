//! Scanner service boundary
//!
//! Every operation is one request/response exchange. Callers decide per call
//! site whether an error fails open (treated as an empty result) or aborts.

use async_trait::async_trait;

use super::error::RemoteResult;
use super::types::{RemoteTargetMap, RunningScanSet, ScanSpeed, TargetId};

#[async_trait]
pub trait ScanService: Send + Sync {
    /// `GET info`; `Ok` only on HTTP 200
    async fn check_connectivity(&self) -> RemoteResult<()>;

    /// `GET targets` as an address -> id map
    async fn list_targets(&self) -> RemoteResult<RemoteTargetMap>;

    /// `GET scans`, keeping targets whose current session is processing or scheduled
    async fn list_running_scans(&self) -> RemoteResult<RunningScanSet>;

    /// `POST targets`; `Ok` only on HTTP 201 with a `target_id` in the body
    async fn create_target(&self, address: &str) -> RemoteResult<TargetId>;

    /// `PATCH targets/{id}/configuration`
    async fn set_scan_speed(&self, target_id: &str, speed: ScanSpeed) -> RemoteResult<()>;

    /// `GET me/stats`, returning `scans_running_count`
    async fn running_scan_count(&self) -> RemoteResult<u64>;

    /// `POST scans` with an immediate start; `Ok` only on HTTP 201
    async fn create_scan(&self, target_id: &str, profile_id: &str) -> RemoteResult<()>;
}
