//! Managed-instance catalog: enumerate reservations, keep only the
//! machines opted into management, then attach their volumes.

use ec2gate_common::{ManagedInstance, Result, MANAGED_TAG, MANAGED_VALUE};
use ec2gate_providers::ComputeProvider;
use std::sync::Arc;
use tracing::debug;

fn is_managed(instance: &ManagedInstance) -> bool {
    instance.tags.get(MANAGED_TAG).map(String::as_str) == Some(MANAGED_VALUE)
}

/// Lists managed instances, optionally narrowed to one id. The tag
/// gate always applies: asking for an unmanaged instance by id yields
/// an empty listing, not the instance.
pub async fn list(
    compute: &Arc<dyn ComputeProvider>,
    instance_id: Option<&str>,
) -> Result<Vec<ManagedInstance>> {
    let reservations = compute.describe_reservations().await?;

    let mut machines: Vec<ManagedInstance> = reservations
        .into_iter()
        .flat_map(|r| r.instances)
        .filter(is_managed)
        .filter(|i| instance_id.map_or(true, |wanted| i.id == wanted))
        .collect();

    // Volumes are a second lookup per surviving machine. Only survivors
    // pay for it.
    for machine in machines.iter_mut() {
        machine.volumes = compute.describe_volumes(&machine.id).await?;
    }

    debug!(total = machines.len(), "catalog listing");
    Ok(machines)
}
