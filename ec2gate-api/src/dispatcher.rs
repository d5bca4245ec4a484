//! Lifecycle dispatch: resolve candidates, apply the command, then
//! synchronize DNS when asked. Steps run sequentially, each depending
//! on the previous one's result.

use crate::{catalog, dns_sync};
use crate::session::SessionFactory;
use ec2gate_common::settings::Settings;
use ec2gate_common::{
    AccountContext, GateError, ManagedInstance, RecordAction, Result,
};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    List,
    Start,
    Stop,
    Reboot,
}

impl Operation {
    fn past_tense(self) -> &'static str {
        match self {
            Operation::List => "listed",
            Operation::Start => "started",
            Operation::Stop => "stopped",
            Operation::Reboot => "rebooted",
        }
    }
}

#[derive(Debug)]
pub enum Outcome {
    Listing {
        machines: Vec<ManagedInstance>,
        total: usize,
    },
    Command {
        message: String,
    },
}

/// Runs one operation end to end. A DNS failure after a successful
/// command is terminal for the request; the command itself is not
/// rolled back, so callers should confirm via a follow-up listing.
pub async fn execute(
    factory: &Arc<dyn SessionFactory>,
    settings: &Settings,
    context: &AccountContext,
    operation: Operation,
    instance_id: Option<&str>,
    hostname: Option<&str>,
) -> Result<Outcome> {
    let compute = factory.open_compute(context)?;
    let candidates = catalog::list(&compute, instance_id).await?;

    if candidates.is_empty() {
        return Err(GateError::InstanceNotFound {
            instance_id: instance_id.map(str::to_string),
        });
    }

    if operation == Operation::List {
        let total = candidates.len();
        return Ok(Outcome::Listing {
            machines: candidates,
            total,
        });
    }

    // Commands always name an instance at the HTTP layer; the id
    // filter above means the candidate set is that instance.
    let target = &candidates[0];
    let ids = vec![target.id.clone()];
    match operation {
        Operation::Start => compute.start_instances(&ids).await?,
        Operation::Stop => compute.stop_instances(&ids).await?,
        Operation::Reboot => compute.reboot_instances(&ids).await?,
        Operation::List => unreachable!(),
    }
    info!(instance = %target.id, operation = operation.past_tense(), "command issued");

    let hostname = hostname.filter(|h| !h.is_empty());
    if let Some(hostname) = hostname {
        if let Some(action) = dns_action(operation) {
            // First candidate, first interface: deterministic and
            // deliberately simple.
            let ip = target
                .network_interfaces
                .first()
                .and_then(|ni| ni.public_ip.as_deref())
                .ok_or_else(|| {
                    warn!(instance = %target.id, "dns sync requested without a public ip");
                    GateError::DnsSync {
                        instance_id: target.id.clone(),
                    }
                })?;
            dns_sync::sync(factory, &settings.dns, hostname, ip, action).await?;
        }
    }

    Ok(Outcome::Command {
        message: format!("Instance {} {}", target.id, operation.past_tense()),
    })
}

fn dns_action(operation: Operation) -> Option<RecordAction> {
    match operation {
        Operation::Start => Some(RecordAction::Create),
        Operation::Stop => Some(RecordAction::Delete),
        Operation::List | Operation::Reboot => None,
    }
}
