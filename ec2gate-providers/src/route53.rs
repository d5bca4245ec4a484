//! Route 53 adapter. REST-XML over the global endpoint; every request
//! is signed against us-east-1 regardless of the compute region.

use crate::signing::{canonical_query, SigV4Signer};
use crate::{DnsProvider, HostedZone};
use async_trait::async_trait;
use chrono::Utc;
use ec2gate_common::{DnsRecordChange, GateError, Result};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

pub const API_VERSION: &str = "2013-04-01";
const HOST: &str = "route53.amazonaws.com";
const SIGNING_REGION: &str = "us-east-1";
const RECORD_TTL: u32 = 600;

pub struct Route53Provider {
    client: Client,
    signer: SigV4Signer,
}

impl Route53Provider {
    pub fn new(key: String, secret: String) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| GateError::dns(e.to_string()))?;
        let signer = SigV4Signer::new(
            key,
            secret,
            SIGNING_REGION.to_string(),
            "route53".to_string(),
        );
        Ok(Self { client, signer })
    }
}

#[async_trait]
impl DnsProvider for Route53Provider {
    async fn find_zone(&self, domain: &str) -> Result<Option<HostedZone>> {
        let wanted = fqdn(domain);
        let path = format!("/{API_VERSION}/hostedzonesbyname");
        let query = canonical_query(&[("dnsname", &wanted)]);

        let signed = self
            .signer
            .sign("GET", HOST, &path, &query, &[], b"", Utc::now());

        debug!(domain = %wanted, "route53 zone lookup");
        let resp = self
            .client
            .get(format!("https://{HOST}{path}?{query}"))
            .header("x-amz-date", &signed.amz_date)
            .header("authorization", &signed.authorization)
            .send()
            .await
            .map_err(|e| GateError::dns(format!("zone lookup request failed: {e}")))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| GateError::dns(format!("zone lookup response unreadable: {e}")))?;
        if !status.is_success() {
            return Err(GateError::dns(format!(
                "zone lookup returned {status}: {text}"
            )));
        }

        let parsed: ListHostedZonesByNameResponse = quick_xml::de::from_str(&text)
            .map_err(|e| GateError::dns(format!("bad zone lookup response: {e}")))?;

        // hostedzonesbyname returns zones at or after the requested name;
        // only an exact name match counts as found.
        Ok(parsed
            .hosted_zones
            .hosted_zone
            .into_iter()
            .find(|z| z.name == wanted)
            .map(|z| HostedZone {
                id: strip_zone_prefix(&z.id).to_string(),
                name: z.name,
            }))
    }

    async fn change_record(&self, zone_id: &str, change: &DnsRecordChange) -> Result<()> {
        let path = format!("/{API_VERSION}/hostedzone/{zone_id}/rrset");
        let body = change_batch(change);

        let signed = self.signer.sign(
            "POST",
            HOST,
            &path,
            "",
            &[("content-type", "text/xml")],
            body.as_bytes(),
            Utc::now(),
        );

        info!(action = change.action.as_str(), fqdn = %change.fqdn, ip = %change.ip, "route53 record change");
        let resp = self
            .client
            .post(format!("https://{HOST}{path}"))
            .header("content-type", "text/xml")
            .header("x-amz-date", &signed.amz_date)
            .header("authorization", &signed.authorization)
            .body(body)
            .send()
            .await
            .map_err(|e| GateError::dns(format!("record change request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(GateError::dns(format!(
                "record change returned {status}: {text}"
            )));
        }
        Ok(())
    }
}

/// Zone names on the wire carry a trailing dot.
fn fqdn(domain: &str) -> String {
    if domain.ends_with('.') {
        domain.to_string()
    } else {
        format!("{domain}.")
    }
}

/// Zone ids come back as `/hostedzone/Z123...`; change calls want the
/// bare id.
fn strip_zone_prefix(id: &str) -> &str {
    id.strip_prefix("/hostedzone/").unwrap_or(id)
}

fn change_batch(change: &DnsRecordChange) -> String {
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="UTF-8"?>"#,
            r#"<ChangeResourceRecordSetsRequest xmlns="https://route53.amazonaws.com/doc/{version}/">"#,
            "<ChangeBatch><Changes><Change>",
            "<Action>{action}</Action>",
            "<ResourceRecordSet>",
            "<Name>{name}</Name>",
            "<Type>A</Type>",
            "<TTL>{ttl}</TTL>",
            "<ResourceRecords><ResourceRecord><Value>{value}</Value></ResourceRecord></ResourceRecords>",
            "</ResourceRecordSet>",
            "</Change></Changes></ChangeBatch>",
            "</ChangeResourceRecordSetsRequest>"
        ),
        version = API_VERSION,
        action = change.action.as_str(),
        name = fqdn(&change.fqdn),
        ttl = RECORD_TTL,
        value = change.ip,
    )
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListHostedZonesByNameResponse {
    hosted_zones: HostedZonesXml,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct HostedZonesXml {
    #[serde(default = "Vec::new")]
    hosted_zone: Vec<HostedZoneXml>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct HostedZoneXml {
    id: String,
    name: String,
}
