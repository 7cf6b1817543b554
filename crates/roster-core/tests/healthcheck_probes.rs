//! End-to-end probe behavior against short-lived local HTTP listeners.
//!
//! Verifies that reachability means "any HTTP-layer response", that skips and
//! failures are classified per descriptor, and that file-based specs route
//! through the declared-server-URL heuristic.

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener};
use std::path::Path;
use std::time::Duration;

use roster_core::config::parse_descriptor_document;
use roster_core::probe::{ProbeOutcome, Prober};
use roster_core::resolve::ResolveContext;

/// Serve a fixed number of connections with the given status line, then stop.
fn spawn_http_server(response_status: &'static str, connections: usize) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind test listener");
    let addr = listener.local_addr().unwrap();

    std::thread::spawn(move || {
        for _ in 0..connections {
            let Ok((mut stream, _)) = listener.accept() else {
                return;
            };
            let mut buf = [0u8; 1024];
            let _ = stream.read(&mut buf);
            let response = format!(
                "HTTP/1.1 {response_status}\r\ncontent-length: 0\r\nconnection: close\r\n\r\n"
            );
            let _ = stream.write_all(response.as_bytes());
        }
    });

    addr
}

/// A port that was just freed, so connections are refused.
fn refused_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

fn prober() -> Prober {
    Prober::new(
        ResolveContext::for_invocation_dir(Path::new("/work")),
        Duration::from_secs(2),
    )
    .unwrap()
}

fn single_descriptor(url: &str) -> Vec<roster_core::config::ServerDescriptor> {
    let json = format!(r#"{{"dev":[{{"name":"probe-me","url":"{url}"}}]}}"#);
    parse_descriptor_document(&json)
        .unwrap()
        .effective_descriptors("dev")
}

#[tokio::test]
async fn probe_counts_any_response_as_reachable() {
    let addr = spawn_http_server("200 OK", 1);
    let descriptors = single_descriptor(&format!("http://{addr}/spec/deep/path"));

    let report = prober().probe_all(&descriptors).await;

    assert!(matches!(
        report.reports[0].outcome,
        ProbeOutcome::Reachable { .. }
    ));
    assert!(!report.has_failures());
}

#[tokio::test]
async fn probe_server_error_status_is_still_reachable() {
    let addr = spawn_http_server("500 Internal Server Error", 1);
    let descriptors = single_descriptor(&format!("http://{addr}/spec"));

    let report = prober().probe_all(&descriptors).await;

    assert!(matches!(
        report.reports[0].outcome,
        ProbeOutcome::Reachable { .. }
    ));
}

#[tokio::test]
async fn probe_hits_base_endpoint_not_spec_path() {
    let addr = spawn_http_server("404 Not Found", 1);
    let descriptors = single_descriptor(&format!("http://{addr}/deep/spec.yaml?raw=1"));

    let report = prober().probe_all(&descriptors).await;

    match &report.reports[0].outcome {
        ProbeOutcome::Reachable { endpoint } => {
            assert_eq!(endpoint, &format!("http://{addr}"));
        }
        other => panic!("expected reachable, got {:?}", other),
    }
}

#[tokio::test]
async fn probe_connection_refused_is_unreachable() {
    let port = refused_port();
    let descriptors = single_descriptor(&format!("http://127.0.0.1:{port}/spec"));

    let report = prober().probe_all(&descriptors).await;

    assert!(matches!(
        report.reports[0].outcome,
        ProbeOutcome::Unreachable { .. }
    ));
    assert!(report.has_failures());
}

#[tokio::test]
async fn probe_unsupported_scheme_skips_without_failure() {
    let descriptors = single_descriptor("ftp://archive.test/spec");

    let report = prober().probe_all(&descriptors).await;

    match &report.reports[0].outcome {
        ProbeOutcome::Skipped { reason } => assert!(reason.contains("ftp")),
        other => panic!("expected skip, got {:?}", other),
    }
    assert!(!report.has_failures());
}

#[tokio::test]
async fn probe_missing_url_skips_and_continues() {
    let descriptors = parse_descriptor_document(
        r#"{"dev":[
            {"name":"no-url"},
            {"name":"bad-port","url":"http://127.0.0.1:1/spec"}
        ]}"#,
    )
    .unwrap()
    .effective_descriptors("dev");

    let report = prober().probe_all(&descriptors).await;

    assert_eq!(report.reports.len(), 2);
    assert!(matches!(
        report.reports[0].outcome,
        ProbeOutcome::Skipped { .. }
    ));
    assert!(matches!(
        report.reports[1].outcome,
        ProbeOutcome::Unreachable { .. }
    ));
    assert_eq!(report.counts(), (0, 1, 1));
}

#[tokio::test]
async fn probe_file_spec_uses_declared_server_url() {
    let addr = spawn_http_server("200 OK", 1);

    let dir = tempfile::tempdir().unwrap();
    let spec_path = dir.path().join("api.yaml");
    std::fs::write(
        &spec_path,
        format!("openapi: 3.0.0\nservers:\n  - url: http://{addr}\npaths: {{}}\n"),
    )
    .unwrap();

    let descriptors = single_descriptor(&format!("file://{}", spec_path.display()));
    let report = prober().probe_all(&descriptors).await;

    match &report.reports[0].outcome {
        ProbeOutcome::Reachable { endpoint } => assert_eq!(endpoint, &format!("http://{addr}")),
        other => panic!("expected reachable, got {:?}", other),
    }
}

#[tokio::test]
async fn probe_resolution_failure_is_unreachable() {
    let descriptors = single_descriptor("http://${NOT_PROVIDED}/spec");

    let report = prober().probe_all(&descriptors).await;

    match &report.reports[0].outcome {
        ProbeOutcome::Unreachable { reason, .. } => {
            assert!(reason.contains("NOT_PROVIDED"));
        }
        other => panic!("expected unreachable, got {:?}", other),
    }
}
