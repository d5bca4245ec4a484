//! DNS record synchronization. Start publishes an A record for the
//! machine's public IP, stop retracts it. Best effort in the sense
//! that the lifecycle command is never rolled back when DNS fails; the
//! caller still sees the DNS error.

use crate::session::SessionFactory;
use ec2gate_common::settings::DnsSettings;
use ec2gate_common::{DnsRecordChange, GateError, RecordAction, Result};
use std::sync::Arc;
use tracing::info;

/// Applies one record change for `hostname` under the configured
/// domain. The fully qualified name is `{hostname}.{domain}`.
pub async fn sync(
    factory: &Arc<dyn SessionFactory>,
    dns: &DnsSettings,
    hostname: &str,
    ip: &str,
    action: RecordAction,
) -> Result<()> {
    let domain = dns
        .domain
        .as_deref()
        .ok_or_else(|| GateError::missing("DNS_DOMAIN"))?;
    let key = dns.key.as_deref().ok_or_else(|| GateError::missing("DNS_KEY"))?;
    let secret = dns
        .secret
        .as_deref()
        .ok_or_else(|| GateError::missing("DNS_SECRET"))?;

    let provider = factory.open_dns(key, secret)?;
    let zone = provider
        .find_zone(domain)
        .await?
        .ok_or_else(|| GateError::dns(format!("hosted zone for '{domain}' not found")))?;

    let change = DnsRecordChange {
        action,
        fqdn: format!("{hostname}.{domain}"),
        ip: ip.to_string(),
    };
    provider.change_record(&zone.id, &change).await?;
    info!(fqdn = %change.fqdn, action = action.as_str(), "dns record synchronized");
    Ok(())
}
