//! In-memory providers for tests and local runs without cloud
//! credentials. Kept always-on rather than feature-gated so downstream
//! test crates can build against them directly.

use crate::{ComputeProvider, DnsProvider, HostedZone, Reservation};
use async_trait::async_trait;
use ec2gate_common::{
    DnsRecordChange, GateError, InstanceState, ManagedInstance, NetworkInterface, Result, Volume,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

#[derive(Default)]
pub struct MockCompute {
    reservations: Mutex<Vec<Reservation>>,
    volumes: Mutex<HashMap<String, Vec<Volume>>>,
    started: Mutex<Vec<String>>,
    stopped: Mutex<Vec<String>>,
    rebooted: Mutex<Vec<String>>,
    volume_queries: Mutex<Vec<String>>,
    fail_commands: Mutex<bool>,
}

impl MockCompute {
    pub fn new(reservations: Vec<Reservation>) -> Self {
        Self {
            reservations: Mutex::new(reservations),
            ..Default::default()
        }
    }

    pub fn with_volumes(self, instance_id: &str, volumes: Vec<Volume>) -> Self {
        self.volumes
            .lock()
            .unwrap()
            .insert(instance_id.to_string(), volumes);
        self
    }

    /// Subsequent start/stop/reboot calls fail with a provider error.
    pub fn failing_commands(self) -> Self {
        *self.fail_commands.lock().unwrap() = true;
        self
    }

    pub fn started(&self) -> Vec<String> {
        self.started.lock().unwrap().clone()
    }

    pub fn stopped(&self) -> Vec<String> {
        self.stopped.lock().unwrap().clone()
    }

    pub fn rebooted(&self) -> Vec<String> {
        self.rebooted.lock().unwrap().clone()
    }

    pub fn volume_queries(&self) -> Vec<String> {
        self.volume_queries.lock().unwrap().clone()
    }

    fn set_state(&self, ids: &[String], state: InstanceState) {
        let mut reservations = self.reservations.lock().unwrap();
        for reservation in reservations.iter_mut() {
            for instance in reservation.instances.iter_mut() {
                if ids.contains(&instance.id) {
                    instance.state = state;
                }
            }
        }
    }

    fn check_fail(&self) -> Result<()> {
        if *self.fail_commands.lock().unwrap() {
            return Err(GateError::provider("mock command failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl ComputeProvider for MockCompute {
    async fn describe_reservations(&self) -> Result<Vec<Reservation>> {
        Ok(self.reservations.lock().unwrap().clone())
    }

    async fn describe_volumes(&self, instance_id: &str) -> Result<Vec<Volume>> {
        self.volume_queries
            .lock()
            .unwrap()
            .push(instance_id.to_string());
        Ok(self
            .volumes
            .lock()
            .unwrap()
            .get(instance_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn start_instances(&self, ids: &[String]) -> Result<()> {
        self.check_fail()?;
        self.started.lock().unwrap().extend_from_slice(ids);
        self.set_state(ids, InstanceState::Pending);
        Ok(())
    }

    async fn stop_instances(&self, ids: &[String]) -> Result<()> {
        self.check_fail()?;
        self.stopped.lock().unwrap().extend_from_slice(ids);
        self.set_state(ids, InstanceState::Stopping);
        Ok(())
    }

    async fn reboot_instances(&self, ids: &[String]) -> Result<()> {
        self.check_fail()?;
        self.rebooted.lock().unwrap().extend_from_slice(ids);
        Ok(())
    }
}

#[derive(Default)]
pub struct MockDns {
    zones: Vec<HostedZone>,
    changes: Mutex<Vec<(String, DnsRecordChange)>>,
    fail: bool,
}

impl MockDns {
    pub fn new(zones: Vec<HostedZone>) -> Self {
        Self {
            zones,
            ..Default::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn changes(&self) -> Vec<(String, DnsRecordChange)> {
        self.changes.lock().unwrap().clone()
    }
}

#[async_trait]
impl DnsProvider for MockDns {
    async fn find_zone(&self, domain: &str) -> Result<Option<HostedZone>> {
        if self.fail {
            return Err(GateError::dns("mock dns failure"));
        }
        let wanted = domain.trim_end_matches('.');
        Ok(self
            .zones
            .iter()
            .find(|z| z.name.trim_end_matches('.') == wanted)
            .cloned())
    }

    async fn change_record(&self, zone_id: &str, change: &DnsRecordChange) -> Result<()> {
        if self.fail {
            return Err(GateError::dns("mock dns failure"));
        }
        self.changes
            .lock()
            .unwrap()
            .push((zone_id.to_string(), change.clone()));
        Ok(())
    }
}

/// Builds a managed instance suitable for most tests. The `managed=auto`
/// tag is present; strip it with `untagged` when the test needs an
/// unmanaged machine.
pub fn managed_instance(id: &str, public_ip: Option<&str>) -> ManagedInstance {
    let mut tags = BTreeMap::new();
    tags.insert("managed".to_string(), "auto".to_string());
    ManagedInstance {
        id: id.to_string(),
        instance_type: Some("t3.small".to_string()),
        region: "eu-west-1".to_string(),
        availability_zone: Some("eu-west-1a".to_string()),
        tags,
        state: InstanceState::Running,
        launch_time: None,
        image_id: Some("ami-0abcdef".to_string()),
        network_interfaces: vec![NetworkInterface {
            public_ip: public_ip.map(str::to_string),
            public_dns: None,
            private_ip: Some("10.0.0.10".to_string()),
            private_dns: None,
        }],
        security_groups: Vec::new(),
        volumes: Vec::new(),
    }
}

pub fn untagged(mut instance: ManagedInstance) -> ManagedInstance {
    instance.tags.remove("managed");
    instance
}

pub fn reservation(id: &str, instances: Vec<ManagedInstance>) -> Reservation {
    Reservation {
        id: id.to_string(),
        instances,
    }
}
