// Integration tests for instance endpoints against mock providers.

mod common;

use axum_test::TestServer;
use common::{create_test_app, test_settings};
use ec2gate_common::{RecordAction, Settings, Volume};
use ec2gate_providers::mock::{managed_instance, reservation, untagged, MockCompute, MockDns};
use ec2gate_providers::HostedZone;
use serde_json::Value;

fn default_fleet() -> MockCompute {
    MockCompute::new(vec![reservation(
        "r-1",
        vec![
            managed_instance("i-100", Some("203.0.113.5")),
            untagged(managed_instance("i-200", None)),
        ],
    )])
    .with_volumes(
        "i-100",
        vec![Volume {
            id: "vol-1".to_string(),
            size_gb: Some(40),
            volume_type: Some("gp3".to_string()),
            created: None,
        }],
    )
}

fn example_zone() -> MockDns {
    MockDns::new(vec![HostedZone {
        id: "Z1".to_string(),
        name: "example.com.".to_string(),
    }])
}

#[tokio::test]
async fn list_returns_only_managed_instances() {
    let (app, _, _) = create_test_app(test_settings(&[]), default_fleet(), MockDns::default());
    let server = TestServer::new(app).unwrap();

    let response = server.get("/instances").await;
    assert_eq!(response.status_code(), 200);

    let body: Value = response.json();
    assert_eq!(body["result"], "ok");
    assert_eq!(body["total"], 1);
    assert_eq!(body["machine"][0]["id"], "i-100");
    assert_eq!(body["machine"][0]["volumes"][0]["id"], "vol-1");
}

#[tokio::test]
async fn get_by_id_respects_the_tag_gate() {
    let (app, _, _) = create_test_app(test_settings(&[]), default_fleet(), MockDns::default());
    let server = TestServer::new(app).unwrap();

    let ok = server.get("/instances/i-100").await;
    assert_eq!(ok.status_code(), 200);
    let body: Value = ok.json();
    assert_eq!(body["total"], 1);

    // The untagged machine is invisible even when named directly.
    let ko = server.get("/instances/i-200").await;
    assert_eq!(ko.status_code(), 500);
    let body: Value = ko.json();
    assert_eq!(body["result"], "ko");
    assert_eq!(body["message"], "no managed machine");
}

#[tokio::test]
async fn empty_fleet_reports_no_managed_machines() {
    let (app, _, _) = create_test_app(test_settings(&[]), MockCompute::default(), MockDns::default());
    let server = TestServer::new(app).unwrap();

    let response = server.get("/instances").await;
    assert_eq!(response.status_code(), 500);
    let body: Value = response.json();
    assert_eq!(body["message"], "no managed machines");
}

#[tokio::test]
async fn start_with_hostname_creates_a_dns_record() {
    let (app, compute, dns) = create_test_app(
        test_settings(&[("DNS_DOMAIN", "example.com")]),
        default_fleet(),
        example_zone(),
    );
    let server = TestServer::new(app).unwrap();

    let response = server.get("/instances/i-100/start?hostname=web1").await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["result"], "ok");
    assert_eq!(body["message"], "Instance i-100 started");

    assert_eq!(compute.started(), vec!["i-100".to_string()]);
    let changes = dns.changes();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].1.fqdn, "web1.example.com");
    assert_eq!(changes[0].1.ip, "203.0.113.5");
    assert_eq!(changes[0].1.action, RecordAction::Create);
}

#[tokio::test]
async fn start_without_hostname_skips_dns() {
    let (app, compute, dns) = create_test_app(
        test_settings(&[("DNS_DOMAIN", "example.com")]),
        default_fleet(),
        example_zone(),
    );
    let server = TestServer::new(app).unwrap();

    let response = server.get("/instances/i-100/start").await;
    assert_eq!(response.status_code(), 200);
    assert_eq!(compute.started(), vec!["i-100".to_string()]);
    assert!(dns.changes().is_empty());
}

#[tokio::test]
async fn stop_with_hostname_deletes_the_record() {
    let (app, compute, dns) = create_test_app(
        test_settings(&[("DNS_DOMAIN", "example.com")]),
        default_fleet(),
        example_zone(),
    );
    let server = TestServer::new(app).unwrap();

    let response = server.get("/instances/i-100/stop?hostname=web1").await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["message"], "Instance i-100 stopped");

    assert_eq!(compute.stopped(), vec!["i-100".to_string()]);
    assert_eq!(dns.changes()[0].1.action, RecordAction::Delete);
}

#[tokio::test]
async fn reboot_ignores_hostname() {
    let (app, compute, dns) = create_test_app(
        test_settings(&[("DNS_DOMAIN", "example.com")]),
        default_fleet(),
        example_zone(),
    );
    let server = TestServer::new(app).unwrap();

    let response = server.get("/instances/i-100/reboot?hostname=web1").await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["message"], "Instance i-100 rebooted");
    assert_eq!(compute.rebooted(), vec!["i-100".to_string()]);
    assert!(dns.changes().is_empty());
}

#[tokio::test]
async fn start_then_list_reflects_the_transition() {
    let (app, _, _) = create_test_app(
        test_settings(&[]),
        MockCompute::new(vec![reservation(
            "r-1",
            vec![managed_instance("i-100", Some("203.0.113.5"))],
        )]),
        MockDns::default(),
    );
    let server = TestServer::new(app).unwrap();

    server.get("/instances/i-100/start").await.assert_status_ok();
    let response = server.get("/instances/i-100").await;
    let body: Value = response.json();
    assert_eq!(body["machine"][0]["state"], "pending");
}

#[tokio::test]
async fn missing_public_ip_fails_sync_but_the_start_went_out() {
    let (app, compute, dns) = create_test_app(
        test_settings(&[("DNS_DOMAIN", "example.com")]),
        MockCompute::new(vec![reservation(
            "r-1",
            vec![managed_instance("i-100", None)],
        )]),
        example_zone(),
    );
    let server = TestServer::new(app).unwrap();

    let response = server.get("/instances/i-100/start?hostname=web1").await;
    assert_eq!(response.status_code(), 500);
    let body: Value = response.json();
    assert_eq!(
        body["message"],
        "instance i-100 has no public IP address to synchronize"
    );
    assert_eq!(compute.started(), vec!["i-100".to_string()]);
    assert!(dns.changes().is_empty());
}

#[tokio::test]
async fn dns_provider_failure_is_terminal_but_the_start_went_out() {
    let (app, compute, dns) = create_test_app(
        test_settings(&[("DNS_DOMAIN", "example.com")]),
        default_fleet(),
        MockDns::failing(),
    );
    let server = TestServer::new(app).unwrap();

    let response = server.get("/instances/i-100/start?hostname=web1").await;
    assert_eq!(response.status_code(), 500);
    let body: Value = response.json();
    assert_eq!(body["result"], "ko");
    assert_eq!(body["message"], "dns provider error: mock dns failure");

    // The command was committed before the sync attempt; no rollback.
    assert_eq!(compute.started(), vec!["i-100".to_string()]);
    assert!(dns.changes().is_empty());
}

#[tokio::test]
async fn missing_credentials_are_reported() {
    let (app, _, _) = create_test_app(
        Settings::default(),
        default_fleet(),
        MockDns::default(),
    );
    let server = TestServer::new(app).unwrap();

    let response = server.get("/instances").await;
    assert_eq!(response.status_code(), 500);
    let body: Value = response.json();
    assert_eq!(body["result"], "ko");
    assert_eq!(body["message"], "missing credential: AWS_KEY");
}

#[tokio::test]
async fn explicit_query_credentials_satisfy_resolution() {
    let (app, _, _) = create_test_app(
        Settings::default(),
        default_fleet(),
        MockDns::default(),
    );
    let server = TestServer::new(app).unwrap();

    let response = server
        .get("/instances?region=eu-west-1&key=AKIAX&secret=sx")
        .await;
    assert_eq!(response.status_code(), 200);
}

#[tokio::test]
async fn root_serves_a_banner() {
    let (app, _, _) = create_test_app(test_settings(&[]), MockCompute::default(), MockDns::default());
    let server = TestServer::new(app).unwrap();
    let response = server.get("/").await;
    response.assert_status_ok();
    assert!(response.text().contains("EC2 Gate"));
}
