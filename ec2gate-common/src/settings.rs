use std::collections::BTreeMap;

/// Immutable configuration snapshot, read once at process start and
/// shared read-only across requests. Missing credential fields are not
/// an error here; they surface as `MissingCredential` when a request
/// actually needs them.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    /// Default AWS credentials and region.
    pub aws: AwsAccount,
    /// Named account sections, keyed by lowercase account name.
    pub accounts: BTreeMap<String, AwsAccount>,
    pub dns: DnsSettings,
    pub service: ServiceSettings,
}

#[derive(Debug, Clone, Default)]
pub struct AwsAccount {
    pub region: Option<String>,
    pub key: Option<String>,
    pub secret: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct DnsSettings {
    pub region: Option<String>,
    pub key: Option<String>,
    pub secret: Option<String>,
    pub domain: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub listen: String,
    pub port: u16,
    pub debug: bool,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0".to_string(),
            port: 8080,
            debug: false,
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a snapshot from an arbitrary key/value source. `from_env`
    /// is the production path; tests feed a map instead.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| get(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let aws = AwsAccount {
            region: get("AWS_REGION"),
            key: get("AWS_KEY"),
            secret: get("AWS_SECRET"),
        };

        // Multi-account support: EC2GATE_ACCOUNTS lists the section
        // names, each section is read from <NAME>_AWS_{KEY,SECRET,REGION}.
        let mut accounts = BTreeMap::new();
        if let Some(names) = get("EC2GATE_ACCOUNTS") {
            for name in names.split(',').map(str::trim).filter(|n| !n.is_empty()) {
                let prefix = name.to_uppercase().replace('-', "_");
                accounts.insert(
                    name.to_lowercase(),
                    AwsAccount {
                        region: get(&format!("{prefix}_AWS_REGION")),
                        key: get(&format!("{prefix}_AWS_KEY")),
                        secret: get(&format!("{prefix}_AWS_SECRET")),
                    },
                );
            }
        }

        // DNS credentials fall back to the default AWS pair so a
        // single-account deployment only configures the domain.
        let dns = DnsSettings {
            region: get("DNS_REGION").or_else(|| aws.region.clone()),
            key: get("DNS_KEY").or_else(|| aws.key.clone()),
            secret: get("DNS_SECRET").or_else(|| aws.secret.clone()),
            domain: get("DNS_DOMAIN"),
        };

        let service = ServiceSettings {
            listen: get("LISTEN").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: get("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            debug: get("DEBUG")
                .map(|d| matches!(d.to_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
        };

        Self {
            aws,
            accounts,
            dns,
            service,
        }
    }
}
