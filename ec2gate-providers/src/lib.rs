use async_trait::async_trait;
use ec2gate_common::{DnsRecordChange, ManagedInstance, Result, Volume};

pub mod ec2;
pub mod mock;
pub mod route53;
pub mod signing;

/// A provider's grouping of instances launched together; the unit of
/// enumeration for listing.
#[derive(Debug, Clone)]
pub struct Reservation {
    pub id: String,
    pub instances: Vec<ManagedInstance>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostedZone {
    pub id: String,
    pub name: String,
}

/// Compute capability surface. Adapters speak the provider wire
/// protocol directly; callers never see pagination — implementations
/// drain all pages and hand back one finite sequence.
#[async_trait]
pub trait ComputeProvider: Send + Sync {
    /// Every reservation/instance visible to the account/region pair,
    /// unfiltered. The management-tag gate is the catalog's job.
    async fn describe_reservations(&self) -> Result<Vec<Reservation>>;

    /// Volumes attached to one instance id.
    async fn describe_volumes(&self, instance_id: &str) -> Result<Vec<Volume>>;

    async fn start_instances(&self, ids: &[String]) -> Result<()>;
    async fn stop_instances(&self, ids: &[String]) -> Result<()>;
    async fn reboot_instances(&self, ids: &[String]) -> Result<()>;
}

/// DNS capability surface: resolve a zone by domain, commit one
/// change-set.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    async fn find_zone(&self, domain: &str) -> Result<Option<HostedZone>>;

    /// Commit a single-record change batch atomically.
    async fn change_record(&self, zone_id: &str, change: &DnsRecordChange) -> Result<()>;
}
