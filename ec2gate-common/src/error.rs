use thiserror::Error;

/// Caller-facing error taxonomy. Nothing here is retried or recovered
/// internally; every variant maps to one HTTP 500 at the boundary.
#[derive(Debug, Error)]
pub enum GateError {
    #[error("missing credential: {field}")]
    MissingCredential { field: String },

    #[error("region '{region}' is not a known EC2 region")]
    InvalidRegion { region: String },

    #[error("provider connection failed: {message}")]
    ProviderConnection { message: String },

    // The wording distinguishes "asked for one id" from "listed all".
    #[error("{}", .instance_id.as_deref().map_or("no managed machines", |_| "no managed machine"))]
    InstanceNotFound { instance_id: Option<String> },

    #[error("dns provider error: {message}")]
    DnsProvider { message: String },

    #[error("instance {instance_id} has no public IP address to synchronize")]
    DnsSync { instance_id: String },
}

impl GateError {
    pub fn missing(field: &str) -> Self {
        Self::MissingCredential {
            field: field.to_string(),
        }
    }

    pub fn provider(message: impl Into<String>) -> Self {
        Self::ProviderConnection {
            message: message.into(),
        }
    }

    pub fn dns(message: impl Into<String>) -> Self {
        Self::DnsProvider {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, GateError>;
