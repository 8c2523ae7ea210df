//! Remote reference resolution through the local schema server.

mod common;

use common::{all_adapters, remotes_dir, write_fixture};
use schema_bench::runner::Scope;
use schema_bench::{ConformanceRunner, RemoteSchemaServer, Verdict};
use std::net::SocketAddr;

fn any_port() -> SocketAddr {
    "127.0.0.1:0".parse().unwrap()
}

fn ref_fixture(url: &str) -> String {
    format!(
        r#"[{{"description": "remote ref", "schema": {{"$ref": "{url}"}}, "tests": [
            {{"description": "remote ref valid", "data": 1, "valid": true}},
            {{"description": "remote ref invalid", "data": "a", "valid": false}}
        ]}}]"#
    )
}

#[test]
fn test_remote_ref_resolves_through_server() {
    let server = RemoteSchemaServer::start(remotes_dir(), any_port()).unwrap();
    let temp = tempfile::tempdir().unwrap();
    write_fixture(temp.path(), "refRemote.json", &ref_fixture(&server.url("integer.json")));

    for mut adapter in all_adapters() {
        let report = ConformanceRunner::new(adapter.as_mut())
            .run_dir(temp.path())
            .unwrap();
        assert!(report.is_success(), "{}: {:?}", report, report.outcomes);
        assert_eq!(report.passed(), 2);
    }

    server.shutdown();
}

#[test]
fn test_remote_ref_into_subfolder() {
    let server = RemoteSchemaServer::start(remotes_dir(), any_port()).unwrap();
    let temp = tempfile::tempdir().unwrap();
    write_fixture(
        temp.path(),
        "refRemote.json",
        &ref_fixture(&server.url("folder/folderInteger.json")),
    );

    for mut adapter in all_adapters() {
        let report = ConformanceRunner::new(adapter.as_mut())
            .run_dir(temp.path())
            .unwrap();
        assert!(report.is_success(), "{}: {:?}", report, report.outcomes);
    }
}

#[test]
fn test_unreachable_remote_ref_is_a_group_failure() {
    // Reserve a port, then release it so nothing is listening there.
    let addr = std::net::TcpListener::bind(any_port())
        .unwrap()
        .local_addr()
        .unwrap();
    let temp = tempfile::tempdir().unwrap();
    write_fixture(
        temp.path(),
        "refRemote.json",
        &ref_fixture(&format!("http://{}/integer.json", addr)),
    );

    for mut adapter in all_adapters() {
        let report = ConformanceRunner::new(adapter.as_mut())
            .run_dir(temp.path())
            .unwrap();

        assert_eq!(report.outcomes.len(), 1, "{:?}", report.outcomes);
        let outcome = &report.outcomes[0];
        assert_eq!(outcome.label, "refRemote.json:remote ref");
        assert_eq!(outcome.scope, Scope::Group);
        assert!(matches!(outcome.verdict, Verdict::Compile(_)), "{}", outcome);
    }
}

#[test]
fn test_missing_remote_document_is_a_group_failure() {
    let server = RemoteSchemaServer::start(remotes_dir(), any_port()).unwrap();
    let temp = tempfile::tempdir().unwrap();
    write_fixture(temp.path(), "refRemote.json", &ref_fixture(&server.url("absent.json")));

    for mut adapter in all_adapters() {
        let report = ConformanceRunner::new(adapter.as_mut())
            .run_dir(temp.path())
            .unwrap();
        assert_eq!(report.outcomes.len(), 1);
        assert!(matches!(report.outcomes[0].verdict, Verdict::Compile(_)));
    }
}
