// Common test utilities and fixtures
use axum::Router;
use ec2gate_api::app::AppState;
use ec2gate_api::build_app;
use ec2gate_api::session::SessionFactory;
use ec2gate_common::{AccountContext, Result, Settings};
use ec2gate_providers::mock::{MockCompute, MockDns};
use ec2gate_providers::{ComputeProvider, DnsProvider};
use std::collections::HashMap;
use std::sync::Arc;

/// Session factory backed by mock providers; every request gets the
/// same shared instances so tests can inspect recorded calls.
pub struct MockSessionFactory {
    pub compute: Arc<MockCompute>,
    pub dns: Arc<MockDns>,
}

impl SessionFactory for MockSessionFactory {
    fn open_compute(&self, _ctx: &AccountContext) -> Result<Arc<dyn ComputeProvider>> {
        Ok(self.compute.clone())
    }

    fn open_dns(&self, _key: &str, _secret: &str) -> Result<Arc<dyn DnsProvider>> {
        Ok(self.dns.clone())
    }
}

pub fn test_settings(extra: &[(&str, &str)]) -> Settings {
    let mut vars: HashMap<String, String> = [
        ("AWS_REGION", "eu-west-1"),
        ("AWS_KEY", "AKIATEST"),
        ("AWS_SECRET", "testsecret"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    for (k, v) in extra {
        vars.insert(k.to_string(), v.to_string());
    }
    Settings::from_lookup(|key| vars.get(key).cloned())
}

pub fn create_test_app(
    settings: Settings,
    compute: MockCompute,
    dns: MockDns,
) -> (Router, Arc<MockCompute>, Arc<MockDns>) {
    let compute = Arc::new(compute);
    let dns = Arc::new(dns);
    let factory: Arc<dyn SessionFactory> = Arc::new(MockSessionFactory {
        compute: compute.clone(),
        dns: dns.clone(),
    });
    let state = AppState::new(settings, factory);
    (build_app(state), compute, dns)
}
