//! Session opening. A session is just a configured provider adapter;
//! the factory seam lets tests swap in mocks without touching the
//! dispatch path.

use ec2gate_common::{AccountContext, GateError, Result};
use ec2gate_providers::ec2::{self, Ec2Provider};
use ec2gate_providers::route53::Route53Provider;
use ec2gate_providers::{ComputeProvider, DnsProvider};
use std::sync::Arc;

pub trait SessionFactory: Send + Sync {
    fn open_compute(&self, ctx: &AccountContext) -> Result<Arc<dyn ComputeProvider>>;
    fn open_dns(&self, key: &str, secret: &str) -> Result<Arc<dyn DnsProvider>>;
}

/// Production factory. Region validation happens here, before any
/// adapter is constructed, so an unknown region never reaches the
/// network.
pub struct AwsSessionFactory;

impl SessionFactory for AwsSessionFactory {
    fn open_compute(&self, ctx: &AccountContext) -> Result<Arc<dyn ComputeProvider>> {
        if !ec2::REGIONS.contains(&ctx.region.as_str()) {
            return Err(GateError::InvalidRegion {
                region: ctx.region.clone(),
            });
        }
        let provider = Ec2Provider::new(ctx.region.clone(), ctx.key.clone(), ctx.secret.clone())?;
        Ok(Arc::new(provider))
    }

    fn open_dns(&self, key: &str, secret: &str) -> Result<Arc<dyn DnsProvider>> {
        let provider = Route53Provider::new(key.to_string(), secret.to_string())?;
        Ok(Arc::new(provider))
    }
}
