//! `GitHubClient` against a one-shot HTTP stub on localhost.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::sync::{mpsc, Arc, Mutex};
use std::thread;

use rstest::rstest;
use schemasync_core::{BranchName, ProposalRequest, RepoSlug};
use schemasync_remote::{GitHubClient, ProposalLocator, ProposalPublisher, RemoteError};

struct Captured {
    request_line: String,
    headers: Vec<(String, String)>,
    body: String,
}

impl Captured {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Serve exactly one response, returning the endpoint URL and the captured request.
fn serve_once(status: u16, body: &'static str) -> (String, mpsc::Receiver<Captured>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let url = format!("http://{}/graphql", listener.local_addr().unwrap());
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        let (stream, _) = listener.accept().expect("accept");
        let mut reader = BufReader::new(stream.try_clone().expect("clone"));

        let mut request_line = String::new();
        reader.read_line(&mut request_line).expect("request line");
        let mut headers = Vec::new();
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).expect("header");
            let line = line.trim_end();
            if line.is_empty() {
                break;
            }
            if let Some((k, v)) = line.split_once(':') {
                headers.push((k.trim().to_string(), v.trim().to_string()));
            }
        }
        let len: usize = headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
            .and_then(|(_, v)| v.parse().ok())
            .unwrap_or(0);
        let mut buf = vec![0u8; len];
        reader.read_exact(&mut buf).expect("body");

        let mut stream = stream;
        write!(
            stream,
            "HTTP/1.1 {status} STUB\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        )
        .expect("write response");
        stream.flush().ok();

        tx.send(Captured {
            request_line: request_line.trim_end().to_string(),
            headers,
            body: String::from_utf8(buf).expect("utf8 body"),
        })
        .ok();
    });

    (url, rx)
}

fn repo() -> RepoSlug {
    RepoSlug {
        owner: "acme".into(),
        name: "mobile".into(),
    }
}

#[test]
fn lookup_sends_variables_and_bearer_token() {
    let (url, rx) = serve_once(
        200,
        r#"{"data":{"repository":{"id":"R_kgDO","defaultBranchRef":{"name":"main"},"pullRequests":{"nodes":[{"state":"CLOSED"}]}}}}"#,
    );
    let client = GitHubClient::new("ghp_token").with_endpoint(url);

    let details = client
        .lookup(&repo(), &BranchName::from("update-schema-03-07_09-05"))
        .expect("lookup");
    assert_eq!(details.id, "R_kgDO");
    assert_eq!(details.default_branch, "main");
    assert!(!details.has_open_proposal);

    let req = rx.recv().expect("captured");
    assert!(req.request_line.starts_with("POST /graphql"));
    assert_eq!(req.header("authorization"), Some("bearer ghp_token"));
    let body: serde_json::Value = serde_json::from_str(&req.body).expect("json body");
    assert_eq!(body["variables"]["owner"], "acme");
    assert_eq!(body["variables"]["name"], "mobile");
    assert_eq!(body["variables"]["head"], "update-schema-03-07_09-05");
    assert!(body["query"].as_str().unwrap().contains("pullRequests"));
}

#[test]
fn lookup_reports_open_pull_request() {
    let (url, _rx) = serve_once(
        200,
        r#"{"data":{"repository":{"id":"R_1","defaultBranchRef":{"name":"develop"},"pullRequests":{"nodes":[{"state":"MERGED"},{"state":"OPEN"}]}}}}"#,
    );
    let client = GitHubClient::new("t").with_endpoint(url);
    let details = client.lookup(&repo(), &BranchName::from("b")).expect("lookup");
    assert!(details.has_open_proposal);
    assert_eq!(details.default_branch, "develop");
}

#[rstest]
#[case::unauthorized(401, r#"{"message":"Bad credentials"}"#, "Bad credentials")]
#[case::server_error(502, "upstream unavailable", "upstream unavailable")]
#[case::graphql_error(200, r#"{"errors":[{"message":"Could not resolve to a Repository"}]}"#, "Could not resolve")]
#[case::null_repository(200, r#"{"data":{"repository":null}}"#, "repository missing")]
fn lookup_failures_are_query_failed(
    #[case] status: u16,
    #[case] body: &'static str,
    #[case] expected: &str,
) {
    let (url, _rx) = serve_once(status, body);
    let client = GitHubClient::new("t").with_endpoint(url);
    let err = client.lookup(&repo(), &BranchName::from("b")).unwrap_err();
    match &err {
        RemoteError::QueryFailed { status: got, body } => {
            assert_eq!(*got, Some(status));
            assert!(body.contains(expected), "body: {body}");
        }
        other => panic!("expected QueryFailed, got {other:?}"),
    }
}

#[test]
fn lookup_without_server_has_no_status() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let url = format!("http://{}/graphql", listener.local_addr().unwrap());
    drop(listener);

    let client = GitHubClient::new("t").with_endpoint(url);
    let err = client.lookup(&repo(), &BranchName::from("b")).unwrap_err();
    assert!(matches!(err, RemoteError::QueryFailed { status: None, .. }), "got: {err}");
}

#[test]
fn create_sends_mutation_input() {
    let (url, rx) = serve_once(
        200,
        r#"{"data":{"createPullRequest":{"clientMutationId":null}}}"#,
    );
    let client = GitHubClient::new("t").with_endpoint(url);
    client
        .create(&ProposalRequest {
            repository_id: "R_1".into(),
            base: "main".into(),
            head: BranchName::from("update-schema"),
            title: "Update \"schema\"".into(),
            body: "Automated.\nDo not edit.".into(),
        })
        .expect("create");

    let req = rx.recv().expect("captured");
    let body: serde_json::Value = serde_json::from_str(&req.body).expect("json body");
    let input = &body["variables"]["input"];
    assert_eq!(input["repositoryId"], "R_1");
    assert_eq!(input["baseRefName"], "main");
    assert_eq!(input["headRefName"], "update-schema");
    assert_eq!(input["title"], "Update \"schema\"");
    assert_eq!(input["body"], "Automated.\nDo not edit.");
    assert!(body["query"].as_str().unwrap().contains("createPullRequest"));
}

#[test]
fn create_failure_is_mutation_failed() {
    let (url, _rx) = serve_once(
        422,
        r#"{"message":"A pull request already exists"}"#,
    );
    let client = GitHubClient::new("t").with_endpoint(url);
    let err = client
        .create(&ProposalRequest {
            repository_id: "R_1".into(),
            base: "main".into(),
            head: BranchName::from("b"),
            title: "t".into(),
            body: "b".into(),
        })
        .unwrap_err();
    match err {
        RemoteError::MutationFailed { status, body } => {
            assert_eq!(status, Some(422));
            assert!(body.contains("already exists"));
        }
        other => panic!("expected MutationFailed, got {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// Log capture
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Run `f` with a debug-level subscriber and return what it logged.
fn capture_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
    let buffer = LogBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false)
        .with_writer(move || writer.clone())
        .finish();
    let result = tracing::subscriber::with_default(subscriber, f);
    let logs = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
    (result, logs)
}

#[test]
fn create_leaves_progress_logging_to_the_caller() {
    let (url, _rx) = serve_once(
        200,
        r#"{"data":{"createPullRequest":{"clientMutationId":null}}}"#,
    );
    let client = GitHubClient::new("t").with_endpoint(url);

    let (result, logs) = capture_logs(|| {
        client.create(&ProposalRequest {
            repository_id: "R_1".into(),
            base: "main".into(),
            head: BranchName::from("update-schema"),
            title: "t".into(),
            body: "b".into(),
        })
    });

    result.expect("create");
    assert!(!logs.contains("opening pull request"), "{logs}");
    assert!(!logs.contains(" INFO "), "{logs}");
}
