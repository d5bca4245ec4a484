//! EC2 adapter speaking the Query API (form POST + XML responses).

use crate::signing::SigV4Signer;
use crate::{ComputeProvider, Reservation};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ec2gate_common::{
    GateError, InstanceState, ManagedInstance, NetworkInterface, Result, SecurityGroupRef, Volume,
};
use reqwest::Client;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

pub const API_VERSION: &str = "2016-11-15";

/// Published EC2 region set. Region strings outside this list are
/// rejected before any connection is attempted.
pub const REGIONS: &[&str] = &[
    "af-south-1",
    "ap-east-1",
    "ap-northeast-1",
    "ap-northeast-2",
    "ap-northeast-3",
    "ap-south-1",
    "ap-south-2",
    "ap-southeast-1",
    "ap-southeast-2",
    "ap-southeast-3",
    "ap-southeast-4",
    "ca-central-1",
    "eu-central-1",
    "eu-central-2",
    "eu-north-1",
    "eu-south-1",
    "eu-south-2",
    "eu-west-1",
    "eu-west-2",
    "eu-west-3",
    "me-central-1",
    "me-south-1",
    "sa-east-1",
    "us-east-1",
    "us-east-2",
    "us-west-1",
    "us-west-2",
];

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=utf-8";

pub struct Ec2Provider {
    client: Client,
    signer: SigV4Signer,
    region: String,
    host: String,
}

impl Ec2Provider {
    pub fn new(region: String, key: String, secret: String) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| GateError::provider(e.to_string()))?;
        let host = format!("ec2.{region}.amazonaws.com");
        let signer = SigV4Signer::new(key, secret, region.clone(), "ec2".to_string());
        Ok(Self {
            client,
            signer,
            region,
            host,
        })
    }

    async fn query(&self, action: &str, params: &[(String, String)]) -> Result<String> {
        let mut form: Vec<(&str, &str)> = vec![("Action", action), ("Version", API_VERSION)];
        for (k, v) in params {
            form.push((k.as_str(), v.as_str()));
        }
        let body = form
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        let signed = self.signer.sign(
            "POST",
            &self.host,
            "/",
            "",
            &[("content-type", FORM_CONTENT_TYPE)],
            body.as_bytes(),
            Utc::now(),
        );

        debug!(action, region = %self.region, "ec2 query");
        let resp = self
            .client
            .post(format!("https://{}/", self.host))
            .header("content-type", FORM_CONTENT_TYPE)
            .header("x-amz-date", &signed.amz_date)
            .header("authorization", &signed.authorization)
            .body(body)
            .send()
            .await
            .map_err(|e| GateError::provider(format!("ec2 {action} request failed: {e}")))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| GateError::provider(format!("ec2 {action} response unreadable: {e}")))?;
        if !status.is_success() {
            return Err(GateError::provider(format!(
                "ec2 {action} returned {status}: {text}"
            )));
        }
        Ok(text)
    }

    fn map_instance(&self, raw: InstanceXml) -> Result<ManagedInstance> {
        let state = InstanceState::from_wire(&raw.instance_state.name).ok_or_else(|| {
            GateError::provider(format!(
                "unexpected instance state '{}' for {}",
                raw.instance_state.name, raw.instance_id
            ))
        })?;

        let tags: BTreeMap<String, String> = raw
            .tag_set
            .item
            .into_iter()
            .map(|t| (t.key, t.value))
            .collect();

        // Public fields are set unconditionally; absent addressing is
        // None, never an error.
        let network_interfaces = raw
            .network_interface_set
            .item
            .into_iter()
            .map(|ni| NetworkInterface {
                public_ip: ni.association.as_ref().and_then(|a| a.public_ip.clone()),
                public_dns: ni.association.as_ref().and_then(|a| a.public_dns_name.clone()),
                private_ip: ni.private_ip_address,
                private_dns: ni.private_dns_name,
            })
            .collect();

        let security_groups = raw
            .group_set
            .item
            .into_iter()
            .map(|g| SecurityGroupRef {
                id: g.group_id.unwrap_or_default(),
                name: g.group_name,
            })
            .collect();

        Ok(ManagedInstance {
            id: raw.instance_id,
            instance_type: raw.instance_type,
            region: self.region.clone(),
            availability_zone: raw.placement.and_then(|p| p.availability_zone),
            tags,
            state,
            launch_time: raw.launch_time.as_deref().and_then(parse_timestamp),
            image_id: raw.image_id,
            network_interfaces,
            security_groups,
            volumes: Vec::new(),
        })
    }
}

#[async_trait]
impl ComputeProvider for Ec2Provider {
    async fn describe_reservations(&self) -> Result<Vec<Reservation>> {
        let mut reservations = Vec::new();
        let mut next_token: Option<String> = None;

        // Drain all pages; the caller sees one materialized sequence.
        loop {
            let mut params = Vec::new();
            if let Some(token) = &next_token {
                params.push(("NextToken".to_string(), token.clone()));
            }
            let xml = self.query("DescribeInstances", &params).await?;
            let parsed: DescribeInstancesResponse = quick_xml::de::from_str(&xml)
                .map_err(|e| GateError::provider(format!("bad DescribeInstances response: {e}")))?;

            for raw in parsed.reservation_set.item {
                let mut instances = Vec::with_capacity(raw.instances_set.item.len());
                for inst in raw.instances_set.item {
                    instances.push(self.map_instance(inst)?);
                }
                reservations.push(Reservation {
                    id: raw.reservation_id,
                    instances,
                });
            }

            next_token = parsed.next_token.filter(|t| !t.is_empty());
            if next_token.is_none() {
                break;
            }
        }
        Ok(reservations)
    }

    async fn describe_volumes(&self, instance_id: &str) -> Result<Vec<Volume>> {
        let params = vec![
            ("Filter.1.Name".to_string(), "attachment.instance-id".to_string()),
            ("Filter.1.Value.1".to_string(), instance_id.to_string()),
        ];
        let xml = self.query("DescribeVolumes", &params).await?;
        let parsed: DescribeVolumesResponse = quick_xml::de::from_str(&xml)
            .map_err(|e| GateError::provider(format!("bad DescribeVolumes response: {e}")))?;

        Ok(parsed
            .volume_set
            .item
            .into_iter()
            .map(|v| Volume {
                id: v.volume_id,
                size_gb: v.size,
                volume_type: v.volume_type,
                created: v.create_time.as_deref().and_then(parse_timestamp),
            })
            .collect())
    }

    async fn start_instances(&self, ids: &[String]) -> Result<()> {
        self.query("StartInstances", &instance_id_params(ids)).await?;
        Ok(())
    }

    async fn stop_instances(&self, ids: &[String]) -> Result<()> {
        self.query("StopInstances", &instance_id_params(ids)).await?;
        Ok(())
    }

    async fn reboot_instances(&self, ids: &[String]) -> Result<()> {
        self.query("RebootInstances", &instance_id_params(ids)).await?;
        Ok(())
    }
}

fn instance_id_params(ids: &[String]) -> Vec<(String, String)> {
    ids.iter()
        .enumerate()
        .map(|(i, id)| (format!("InstanceId.{}", i + 1), id.clone()))
        .collect()
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

// --- Wire format (Query API XML) ---

#[derive(Debug, Deserialize)]
struct ItemList<T> {
    #[serde(default = "Vec::new")]
    item: Vec<T>,
}

impl<T> Default for ItemList<T> {
    fn default() -> Self {
        Self { item: Vec::new() }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DescribeInstancesResponse {
    #[serde(default)]
    reservation_set: ItemList<ReservationXml>,
    next_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReservationXml {
    reservation_id: String,
    #[serde(default)]
    instances_set: ItemList<InstanceXml>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InstanceXml {
    instance_id: String,
    image_id: Option<String>,
    instance_state: InstanceStateXml,
    instance_type: Option<String>,
    launch_time: Option<String>,
    placement: Option<PlacementXml>,
    #[serde(default)]
    group_set: ItemList<GroupXml>,
    #[serde(default)]
    tag_set: ItemList<TagXml>,
    #[serde(default)]
    network_interface_set: ItemList<InterfaceXml>,
}

#[derive(Debug, Deserialize)]
struct InstanceStateXml {
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlacementXml {
    availability_zone: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroupXml {
    group_id: Option<String>,
    group_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TagXml {
    key: String,
    value: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InterfaceXml {
    private_ip_address: Option<String>,
    private_dns_name: Option<String>,
    association: Option<AssociationXml>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssociationXml {
    public_ip: Option<String>,
    public_dns_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DescribeVolumesResponse {
    #[serde(default)]
    volume_set: ItemList<VolumeXml>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VolumeXml {
    volume_id: String,
    size: Option<i64>,
    volume_type: Option<String>,
    create_time: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const DESCRIBE_INSTANCES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<DescribeInstancesResponse xmlns="http://ec2.amazonaws.com/doc/2016-11-15/">
  <requestId>8f7724cf-496f-496e-8fe3-example</requestId>
  <reservationSet>
    <item>
      <reservationId>r-1234567890abcdef0</reservationId>
      <instancesSet>
        <item>
          <instanceId>i-100</instanceId>
          <imageId>ami-bff32ccc</imageId>
          <instanceState>
            <code>16</code>
            <name>running</name>
          </instanceState>
          <instanceType>t2.micro</instanceType>
          <launchTime>2016-03-03T12:00:00.000Z</launchTime>
          <placement>
            <availabilityZone>us-east-1a</availabilityZone>
          </placement>
          <groupSet>
            <item>
              <groupId>sg-e4076980</groupId>
              <groupName>SecurityGroup1</groupName>
            </item>
          </groupSet>
          <tagSet>
            <item>
              <key>managed</key>
              <value>auto</value>
            </item>
            <item>
              <key>Name</key>
              <value>web</value>
            </item>
          </tagSet>
          <networkInterfaceSet>
            <item>
              <privateIpAddress>10.0.0.12</privateIpAddress>
              <privateDnsName>ip-10-0-0-12.ec2.internal</privateDnsName>
              <association>
                <publicIp>203.0.113.5</publicIp>
                <publicDnsName>ec2-203-0-113-5.compute-1.amazonaws.com</publicDnsName>
              </association>
            </item>
          </networkInterfaceSet>
        </item>
      </instancesSet>
    </item>
  </reservationSet>
</DescribeInstancesResponse>"#;

    const DESCRIBE_VOLUMES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<DescribeVolumesResponse xmlns="http://ec2.amazonaws.com/doc/2016-11-15/">
  <requestId>59dbff89-35bd-4eac-99ed-example</requestId>
  <volumeSet>
    <item>
      <volumeId>vol-1234567890abcdef0</volumeId>
      <size>80</size>
      <volumeType>gp2</volumeType>
      <createTime>2016-02-25T10:35:04.000Z</createTime>
    </item>
  </volumeSet>
</DescribeVolumesResponse>"#;

    fn provider() -> Ec2Provider {
        Ec2Provider::new(
            "us-east-1".to_string(),
            "AKIDEXAMPLE".to_string(),
            "secret".to_string(),
        )
        .unwrap()
    }

    #[test]
    fn decodes_describe_instances_fixture() {
        let parsed: DescribeInstancesResponse = quick_xml::de::from_str(DESCRIBE_INSTANCES).unwrap();
        assert_eq!(parsed.reservation_set.item.len(), 1);
        assert!(parsed.next_token.is_none());

        let instance = provider()
            .map_instance(parsed.reservation_set.item.into_iter().next().unwrap()
                .instances_set
                .item
                .into_iter()
                .next()
                .unwrap())
            .unwrap();

        assert_eq!(instance.id, "i-100");
        assert_eq!(instance.state, InstanceState::Running);
        assert_eq!(instance.region, "us-east-1");
        assert_eq!(instance.availability_zone.as_deref(), Some("us-east-1a"));
        assert_eq!(instance.tags.get("managed").map(String::as_str), Some("auto"));
        assert_eq!(
            instance.network_interfaces[0].public_ip.as_deref(),
            Some("203.0.113.5")
        );
        assert_eq!(instance.security_groups[0].id, "sg-e4076980");
        assert!(instance.launch_time.is_some());
        assert!(instance.volumes.is_empty());
    }

    #[test]
    fn missing_public_addressing_yields_none() {
        let xml = DESCRIBE_INSTANCES.replace(
            "<association>\n                <publicIp>203.0.113.5</publicIp>\n                <publicDnsName>ec2-203-0-113-5.compute-1.amazonaws.com</publicDnsName>\n              </association>",
            "",
        );
        let parsed: DescribeInstancesResponse = quick_xml::de::from_str(&xml).unwrap();
        let raw = parsed.reservation_set.item.into_iter().next().unwrap()
            .instances_set
            .item
            .into_iter()
            .next()
            .unwrap();
        let instance = provider().map_instance(raw).unwrap();
        assert!(instance.network_interfaces[0].public_ip.is_none());
        assert_eq!(
            instance.network_interfaces[0].private_ip.as_deref(),
            Some("10.0.0.12")
        );
    }

    #[test]
    fn decodes_describe_volumes_fixture() {
        let parsed: DescribeVolumesResponse = quick_xml::de::from_str(DESCRIBE_VOLUMES).unwrap();
        assert_eq!(parsed.volume_set.item.len(), 1);
        let vol = &parsed.volume_set.item[0];
        assert_eq!(vol.volume_id, "vol-1234567890abcdef0");
        assert_eq!(vol.size, Some(80));
        assert_eq!(vol.volume_type.as_deref(), Some("gp2"));
    }

    #[test]
    fn instance_id_params_number_from_one() {
        let params = instance_id_params(&["i-100".to_string(), "i-200".to_string()]);
        assert_eq!(params[0], ("InstanceId.1".to_string(), "i-100".to_string()));
        assert_eq!(params[1], ("InstanceId.2".to_string(), "i-200".to_string()));
    }

    #[test]
    fn region_list_contains_the_classics() {
        assert!(REGIONS.contains(&"us-east-1"));
        assert!(REGIONS.contains(&"eu-west-1"));
        assert!(!REGIONS.contains(&"mordor-south-1"));
    }
}
