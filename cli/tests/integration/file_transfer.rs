//! End-to-end tests for the bounded upload server and the file sender over
//! loopback HTTP.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clusterboot_cli::domain::{ClusterError, ErrorKind, TransferTarget};
use clusterboot_cli::infra::file_sender;
use clusterboot_cli::infra::upload_server::{BoundedFileServer, ServeReport, UploadServerConfig};
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use tempfile::TempDir;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;

const SERVE_DEADLINE: Duration = Duration::from_secs(10);

fn config(storage_root: PathBuf, expected: usize, endpoint: &str) -> UploadServerConfig {
    UploadServerConfig {
        endpoint: endpoint.into(),
        form_field: "file".into(),
        storage_root,
        expected,
        monitor_interval: Duration::from_millis(20),
        shutdown_grace: Duration::from_secs(2),
        max_body_bytes: 1024 * 1024,
    }
}

async fn start(
    dir: &TempDir,
    expected: usize,
    endpoint: &str,
) -> (SocketAddr, JoinHandle<anyhow::Result<ServeReport>>) {
    start_with(config(dir.path().join("results"), expected, endpoint)).await
}

async fn start_with(
    cfg: UploadServerConfig,
) -> (SocketAddr, JoinHandle<anyhow::Result<ServeReport>>) {
    let server = BoundedFileServer::bind(SocketAddr::from(([127, 0, 0, 1], 0)), cfg)
        .await
        .expect("bind");
    let addr = server.local_addr().expect("addr");
    (addr, tokio::spawn(server.serve()))
}

async fn finish(handle: JoinHandle<anyhow::Result<ServeReport>>) -> ServeReport {
    tokio::time::timeout(SERVE_DEADLINE, handle)
        .await
        .expect("server did not shut down")
        .expect("server task")
        .expect("serve")
}

fn payload(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).expect("write payload");
    path
}

fn target(addr: SocketAddr, endpoint: &str, file_path: PathBuf) -> TransferTarget {
    TransferTarget {
        address: addr.ip().to_string(),
        port: addr.port(),
        endpoint: endpoint.into(),
        form_field: "file".into(),
        file_path,
    }
}

fn read(path: &Path) -> String {
    std::fs::read_to_string(path).expect("read stored file")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_uploads_each_get_a_distinct_ordinal() {
    let dir = TempDir::new().expect("tempdir");
    let (addr, server) = start(&dir, 3, "/upload").await;

    let contents = ["alpha", "beta", "gamma"];
    let mut senders = Vec::new();
    for (i, body) in contents.iter().enumerate() {
        let t = target(addr, "/upload", payload(&dir, &format!("out-{i}.txt"), body));
        senders.push(tokio::spawn(async move { file_sender::send(&t).await }));
    }
    for sender in senders {
        sender.await.expect("sender task").expect("upload");
    }

    let report = finish(server).await;
    let root = dir.path().join("results");
    let expected_paths: Vec<PathBuf> = (0..3).map(|k| root.join(k.to_string())).collect();
    assert_eq!(report.stored, expected_paths);

    let stored: HashSet<String> = report.stored.iter().map(|p| read(p)).collect();
    let sent: HashSet<String> = contents.iter().map(|s| (*s).to_string()).collect();
    assert_eq!(stored, sent);
    assert!(!report.forced_close);
}

#[tokio::test]
async fn listener_is_closed_after_last_upload() {
    let dir = TempDir::new().expect("tempdir");
    let (addr, server) = start(&dir, 1, "/upload").await;

    let t = target(addr, "/upload", payload(&dir, "a.txt", "one"));
    file_sender::send(&t).await.expect("upload");
    finish(server).await;

    let err = file_sender::send(&t).await.unwrap_err();
    let kind = err.downcast_ref::<ClusterError>().map(ClusterError::kind);
    assert_eq!(kind, Some(ErrorKind::Transfer));
}

#[tokio::test]
async fn fewer_uploads_than_expected_keeps_serving() {
    let dir = TempDir::new().expect("tempdir");
    let (addr, mut server) = start(&dir, 2, "/upload").await;

    let first = target(addr, "/upload", payload(&dir, "a.txt", "one"));
    file_sender::send(&first).await.expect("first upload");

    let still_running = tokio::time::timeout(Duration::from_millis(300), &mut server).await;
    assert!(still_running.is_err(), "server stopped after one of two uploads");

    let second = target(addr, "/upload", payload(&dir, "b.txt", "two"));
    file_sender::send(&second).await.expect("second upload");
    assert_eq!(finish(server).await.stored.len(), 2);
}

#[tokio::test]
async fn missing_form_field_is_rejected_without_using_a_slot() {
    let dir = TempDir::new().expect("tempdir");
    let (addr, server) = start(&dir, 1, "/upload").await;

    let form = Form::new().part("other", Part::bytes(b"junk".to_vec()).file_name("junk"));
    let response = reqwest::Client::new()
        .post(format!("http://{addr}/upload"))
        .multipart(form)
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let t = target(addr, "/upload", payload(&dir, "a.txt", "kept"));
    file_sender::send(&t).await.expect("upload");
    let report = finish(server).await;
    assert_eq!(report.stored, [dir.path().join("results").join("0")]);
    assert_eq!(read(&report.stored[0]), "kept");
}

#[tokio::test]
async fn other_paths_and_methods_are_refused() {
    let dir = TempDir::new().expect("tempdir");
    let (addr, server) = start(&dir, 1, "/upload").await;
    let client = reqwest::Client::new();

    let wrong_path = client
        .post(format!("http://{addr}/elsewhere"))
        .send()
        .await
        .expect("request");
    assert_eq!(wrong_path.status(), StatusCode::NOT_FOUND);

    let wrong_method = client
        .get(format!("http://{addr}/upload"))
        .send()
        .await
        .expect("request");
    assert_eq!(wrong_method.status(), StatusCode::METHOD_NOT_ALLOWED);

    let t = target(addr, "/upload", payload(&dir, "a.txt", "one"));
    file_sender::send(&t).await.expect("upload");
    assert_eq!(finish(server).await.stored.len(), 1);
}

#[tokio::test]
async fn endpoint_without_leading_slash_is_normalized() {
    let dir = TempDir::new().expect("tempdir");
    let (addr, server) = start(&dir, 1, "results").await;

    let t = target(addr, "results", payload(&dir, "a.txt", "one"));
    file_sender::send(&t).await.expect("upload");
    assert_eq!(finish(server).await.stored.len(), 1);
}

#[tokio::test]
async fn rejected_upload_surfaces_as_transfer_error() {
    let dir = TempDir::new().expect("tempdir");
    let (addr, server) = start(&dir, 1, "/upload").await;

    let mut t = target(addr, "/upload", payload(&dir, "a.txt", "one"));
    t.form_field = "wrong".into();
    let err = file_sender::send(&t).await.unwrap_err();
    let kind = err.downcast_ref::<ClusterError>().map(ClusterError::kind);
    assert_eq!(kind, Some(ErrorKind::Transfer));
    assert!(format!("{err:#}").contains("400"));

    t.form_field = "file".into();
    file_sender::send(&t).await.expect("upload");
    finish(server).await;
}

fn transfer_error(err: &anyhow::Error) -> String {
    let kind = err.downcast_ref::<ClusterError>().map(ClusterError::kind);
    assert_eq!(kind, Some(ErrorKind::Transfer), "unexpected error: {err:#}");
    format!("{err:#}")
}

#[tokio::test]
async fn storage_failure_answers_500_and_frees_the_ordinal() {
    let dir = TempDir::new().expect("tempdir");
    let root = dir.path().join("results");
    let (addr, server) = start(&dir, 2, "/upload").await;

    std::fs::remove_dir_all(&root).expect("remove storage root");
    let lost = target(addr, "/upload", payload(&dir, "lost.txt", "lost"));
    let message = transfer_error(&file_sender::send(&lost).await.unwrap_err());
    assert!(message.contains("500"), "got: {message}");

    std::fs::create_dir_all(&root).expect("recreate storage root");
    for (name, body) in [("b.txt", "beta"), ("c.txt", "gamma")] {
        let t = target(addr, "/upload", payload(&dir, name, body));
        file_sender::send(&t).await.expect("upload");
    }

    let report = finish(server).await;
    assert_eq!(report.stored, [root.join("0"), root.join("1")]);
    let stored: HashSet<String> = report.stored.iter().map(|p| read(p)).collect();
    assert_eq!(stored, HashSet::from(["beta".to_string(), "gamma".to_string()]));
    assert!(!report.forced_close);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn upload_after_the_last_slot_gets_503() {
    let dir = TempDir::new().expect("tempdir");
    let root = dir.path().join("results");
    let mut cfg = config(root.clone(), 3, "/upload");
    // Keep serving long enough after the third upload for a late one to land.
    cfg.monitor_interval = Duration::from_secs(2);
    let (addr, server) = start_with(cfg).await;

    let mut senders = Vec::new();
    for i in 0..3 {
        let t = target(addr, "/upload", payload(&dir, &format!("{i}.txt"), "on time"));
        senders.push(tokio::spawn(async move { file_sender::send(&t).await }));
    }
    for sender in senders {
        sender.await.expect("sender task").expect("upload");
    }

    let late = target(addr, "/upload", payload(&dir, "late.txt", "late"));
    let message = transfer_error(&file_sender::send(&late).await.unwrap_err());
    assert!(message.contains("503"), "got: {message}");

    let report = finish(server).await;
    let expected: Vec<PathBuf> = (0..3).map(|k| root.join(k.to_string())).collect();
    assert_eq!(report.stored, expected);
    assert!(report.stored.iter().all(|p| read(p) == "on time"));
}

#[tokio::test]
async fn stalled_request_is_cut_off_after_grace_period() {
    let dir = TempDir::new().expect("tempdir");
    let mut cfg = config(dir.path().join("results"), 1, "/upload");
    cfg.shutdown_grace = Duration::from_millis(300);
    let (addr, server) = start_with(cfg).await;

    // A request whose body never finishes keeps its connection in flight.
    let mut stalled = TcpStream::connect(addr).await.expect("connect");
    let head = "POST /upload HTTP/1.1\r\n\
                Host: 127.0.0.1\r\n\
                Content-Type: multipart/form-data; boundary=XYZ\r\n\
                Content-Length: 4096\r\n\r\n\
                --XYZ\r\n\
                Content-Disposition: form-data; name=\"file\"; filename=\"slow\"\r\n\r\n\
                partial";
    stalled.write_all(head.as_bytes()).await.expect("write");
    stalled.flush().await.expect("flush");
    tokio::time::sleep(Duration::from_millis(100)).await;

    let t = target(addr, "/upload", payload(&dir, "a.txt", "one"));
    file_sender::send(&t).await.expect("upload");

    let report = finish(server).await;
    assert!(report.forced_close);
    assert_eq!(report.stored, [dir.path().join("results").join("0")]);
    drop(stalled);
}
