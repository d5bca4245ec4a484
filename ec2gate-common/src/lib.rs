use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub mod error;
pub mod settings;

pub use error::{GateError, Result};
pub use settings::{AwsAccount, DnsSettings, ServiceSettings, Settings};

/// Tag key/value that opt an instance into automated management.
/// Instances without this exact pair are invisible to every operation.
pub const MANAGED_TAG: &str = "managed";
pub const MANAGED_VALUE: &str = "auto";

// --- Enums ---

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum InstanceState {
    Pending,
    Running,
    Stopping,
    Stopped,
    Terminating,
    Terminated,
}

impl InstanceState {
    /// Map a provider state name to the lifecycle enum. EC2 reports
    /// `shutting-down` for what we model as terminating.
    pub fn from_wire(name: &str) -> Option<Self> {
        match name {
            "pending" => Some(Self::Pending),
            "running" => Some(Self::Running),
            "stopping" => Some(Self::Stopping),
            "stopped" => Some(Self::Stopped),
            "shutting-down" | "terminating" => Some(Self::Terminating),
            "terminated" => Some(Self::Terminated),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
            Self::Terminating => "terminating",
            Self::Terminated => "terminated",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecordAction {
    Create,
    Delete,
}

impl RecordAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Delete => "DELETE",
        }
    }
}

// --- Entities ---

/// A compute instance that passed the management-tag gate.
///
/// Only ever materialized for provider instances tagged
/// `managed = "auto"`; the catalog enforces that invariant, nothing
/// downstream re-checks it.
#[derive(Debug, Serialize, Deserialize, Clone, utoipa::ToSchema)]
pub struct ManagedInstance {
    pub id: String,
    pub instance_type: Option<String>,
    pub region: String,
    pub availability_zone: Option<String>,
    pub tags: BTreeMap<String, String>,
    pub state: InstanceState,
    pub launch_time: Option<DateTime<Utc>>,
    pub image_id: Option<String>,
    /// Provider enumeration order; the first entry is authoritative
    /// when a single address must be picked.
    pub network_interfaces: Vec<NetworkInterface>,
    pub security_groups: Vec<SecurityGroupRef>,
    pub volumes: Vec<Volume>,
}

/// Public addressing is optional: an instance without it yields `None`
/// here, never an error.
#[derive(Debug, Serialize, Deserialize, Clone, Default, utoipa::ToSchema)]
pub struct NetworkInterface {
    pub public_ip: Option<String>,
    pub public_dns: Option<String>,
    pub private_ip: Option<String>,
    pub private_dns: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, utoipa::ToSchema)]
pub struct SecurityGroupRef {
    pub id: String,
    pub name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, utoipa::ToSchema)]
pub struct Volume {
    pub id: String,
    pub size_gb: Option<i64>,
    pub volume_type: Option<String>,
    pub created: Option<DateTime<Utc>>,
}

/// A single A-record modification, committed atomically as a one-entry
/// change-set.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct DnsRecordChange {
    pub action: RecordAction,
    /// `<hostname>.<configured-domain>`
    pub fqdn: String,
    pub ip: String,
}

/// The resolved {account, region, credentials} tuple scoping one
/// request's provider calls. Built per request, never persisted.
#[derive(Debug, Clone)]
pub struct AccountContext {
    pub account: Option<String>,
    pub region: String,
    pub key: String,
    pub secret: String,
}
