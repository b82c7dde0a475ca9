//! End-to-end tests of the `scrape` command against a wiremock GitHub API.

use camino::Utf8PathBuf;
use gh_orgnet_lib::Host;
use serde_json::json;
use std::fs;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Test host that captures output to in-memory buffers.
struct TestHost {
    output_buf: Vec<u8>,
    error_buf: Vec<u8>,
}

impl TestHost {
    const fn new() -> Self {
        Self {
            output_buf: Vec::new(),
            error_buf: Vec::new(),
        }
    }

    fn output_str(&self) -> String {
        String::from_utf8_lossy(&self.output_buf).into_owned()
    }

    fn error_str(&self) -> String {
        String::from_utf8_lossy(&self.error_buf).into_owned()
    }
}

impl Host for TestHost {
    fn output(&mut self) -> impl std::io::Write {
        &mut self.output_buf
    }

    fn error(&mut self) -> impl std::io::Write {
        &mut self.error_buf
    }

    fn exit(&mut self, _code: i32) {}
}

async fn github() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/orgs/acme/repos"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "name": "widget",
            "full_name": "acme/widget",
            "owner": { "login": "acme" },
            "description": "Widgets, with commas",
            "stargazers_count": 7,
            "forks_count": 2,
            "language": "Rust",
            "fork": false
        }])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .with_priority(10)
        .mount(&server)
        .await;
    server
}

/// The single run directory created under `output_dir`.
fn run_dir(output_dir: &Utf8PathBuf) -> Utf8PathBuf {
    let entries: Vec<_> = output_dir.read_dir_utf8().expect("read output dir").collect();
    assert_eq!(entries.len(), 1, "expected exactly one run directory");
    entries[0].as_ref().expect("entry").path().to_path_buf()
}

fn scrape_args<'a>(server_uri: &'a str, output_dir: &'a str, kinds: &[&'a str]) -> Vec<&'a str> {
    let mut args = vec![
        "gh-orgnet",
        "scrape",
        "--org",
        "acme",
        "--user",
        "octocat",
        "--token",
        "token",
        "--output-dir",
        output_dir,
        "--api-url",
        server_uri,
        "--color",
        "never",
    ];
    args.extend_from_slice(kinds);
    args
}

#[tokio::test]
async fn test_scrape_exports_tables_and_failures() {
    let server = github().await;
    let temp_dir = tempfile::tempdir().expect("temp dir");
    let output_dir = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).expect("utf8 path");
    let uri = server.uri();

    let mut host = TestHost::new();
    let result = gh_orgnet_lib::run(&mut host, scrape_args(&uri, output_dir.as_str(), &["--repos", "--member-infos"])).await;
    assert!(result.is_ok(), "scrape command failed: {result:?}");

    let run_dir = run_dir(&output_dir);
    let repositories = fs::read_to_string(run_dir.join("org_repositories.csv")).expect("repositories csv");
    let mut lines = repositories.lines();
    assert_eq!(
        lines.next(),
        Some("organization,name,full_name,stargazers_count,forks_count,language,created_at,updated_at,homepage,fork,description")
    );
    assert_eq!(lines.next(), Some(r#"acme,widget,acme/widget,7,2,Rust,,,,false,"Widgets, with commas""#));
    assert_eq!(lines.next(), None);

    assert!(host.output_str().contains("org_repositories.csv"));
    assert!(!run_dir.join("members_info.csv").exists());

    let failures = fs::read_to_string(run_dir.join("failures.csv")).expect("failures csv");
    assert!(failures.starts_with("kind,unit,reason\nmember_infos,*,"));
    assert!(host.error_str().contains("[member_infos] *"));
}

#[tokio::test]
async fn test_scrape_memberships_and_contributors() {
    let server = github().await;
    Mock::given(method("GET"))
        .and(path("/orgs/acme/members"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "login": "alice", "html_url": "https://github.com/alice" }])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/widget/contributors"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "login": "alice", "contributions": 4 }])))
        .mount(&server)
        .await;

    let temp_dir = tempfile::tempdir().expect("temp dir");
    let output_dir = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).expect("utf8 path");
    let uri = server.uri();

    let mut host = TestHost::new();
    let result = gh_orgnet_lib::run(&mut host, scrape_args(&uri, output_dir.as_str(), &["-c", "-m"])).await;
    assert!(result.is_ok(), "scrape command failed: {result:?}");

    let run_dir = run_dir(&output_dir);
    for file in [
        "members_list.csv",
        "membership_list.csv",
        "membership_network.gexf",
        "contributor_list.csv",
        "contributor_network.gexf",
    ] {
        assert!(run_dir.join(file).exists(), "{file} should be written");
    }
    assert!(!run_dir.join("failures.csv").exists());

    let gexf = fs::read_to_string(run_dir.join("contributor_network.gexf")).expect("gexf");
    assert!(gexf.contains(r#"source="alice" target="acme/widget""#));
    assert!(gexf.contains(r#"weight="4""#));

    let output = host.output_str();
    let members_at = output.find("members_list.csv").expect("members listed");
    let contributors_at = output.find("contributor_list.csv").expect("contributors listed");
    assert!(members_at < contributors_at, "memberships run before contributors");
}

#[tokio::test]
async fn test_scrape_aborts_on_rejected_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let temp_dir = tempfile::tempdir().expect("temp dir");
    let output_dir = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).expect("utf8 path");
    let uri = server.uri();

    let mut host = TestHost::new();
    let result = gh_orgnet_lib::run(&mut host, scrape_args(&uri, output_dir.as_str(), &["--repos"])).await;
    let err = result.expect_err("rejected credentials must abort");
    assert!(err.to_string().contains("credentials"));
}

#[tokio::test]
async fn test_scrape_abort_still_reports_earlier_failures() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/orgs/acme/members"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .with_priority(10)
        .mount(&server)
        .await;

    let temp_dir = tempfile::tempdir().expect("temp dir");
    let output_dir = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).expect("utf8 path");
    let uri = server.uri();

    let mut host = TestHost::new();
    let result = gh_orgnet_lib::run(&mut host, scrape_args(&uri, output_dir.as_str(), &["--memberships", "--repos"])).await;
    let err = result.expect_err("rejected credentials must abort");
    assert!(err.to_string().contains("credentials"));

    let run_dir = run_dir(&output_dir);
    let failures = fs::read_to_string(run_dir.join("failures.csv")).expect("failures csv");
    assert!(failures.contains("memberships,acme,"), "unexpected failures: {failures}");
    assert!(host.error_str().contains("[memberships] acme"));
    assert!(!run_dir.join("org_repositories.csv").exists());
}

#[tokio::test]
async fn test_scrape_reads_organizations_file() {
    let server = github().await;
    let temp_dir = tempfile::tempdir().expect("temp dir");
    let root = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).expect("utf8 path");
    let orgs_file = root.join("orgs.csv");
    fs::write(&orgs_file, "github_org_name\nacme\n").expect("write orgs");
    let output_dir = root.join("out");
    let uri = server.uri();

    let mut host = TestHost::new();
    let result = gh_orgnet_lib::run(
        &mut host,
        [
            "gh-orgnet",
            "scrape",
            "--repos",
            "--orgs-file",
            orgs_file.as_str(),
            "--user",
            "octocat",
            "--token",
            "token",
            "--output-dir",
            output_dir.as_str(),
            "--api-url",
            uri.as_str(),
        ],
    )
    .await;
    assert!(result.is_ok(), "scrape command failed: {result:?}");

    let run_dir = run_dir(&output_dir);
    let repositories = fs::read_to_string(run_dir.join("org_repositories.csv")).expect("repositories csv");
    assert!(repositories.contains("acme/widget"));
}
