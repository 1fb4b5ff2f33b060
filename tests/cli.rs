//! End-to-end tests for the `op` binary.

use assert_cmd::Command;
use serde_json::Value;
use tempfile::TempDir;

const AT: &str = "2024-05-20T09:30";

fn op(home: &TempDir) -> Command {
    op_at(home, AT)
}

fn op_at(home: &TempDir, at: &str) -> Command {
    let mut cmd = Command::cargo_bin("op").unwrap();
    cmd.arg("--home")
        .arg(home.path())
        .args(["--at", at, "--json"])
        .env_remove("OPERATOR_HOME")
        .env_remove("OPERATOR_NOW")
        .env_remove("OPERATOR_BACKEND_URL")
        .env_remove("OPERATOR_ANON_KEY")
        .env_remove("OPERATOR_ADMIN_EMAILS")
        .env_remove("OPERATOR_PASSWORD")
        .env_remove("RUST_LOG");
    cmd
}

fn json_out(cmd: &mut Command) -> Value {
    let output = cmd.assert().success().get_output().stdout.clone();
    let text = String::from_utf8(output).unwrap();
    serde_json::from_str(text.lines().next().unwrap()).unwrap()
}

fn json_err(cmd: &mut Command, exit: i32) -> Value {
    let output = cmd.assert().code(exit).get_output().stderr.clone();
    let text = String::from_utf8(output).unwrap();
    let line = text.lines().find(|l| l.starts_with('{')).unwrap();
    serde_json::from_str(line).unwrap()
}

fn backend_url(dir: &TempDir) -> String {
    format!("sqlite:{}", dir.path().join("backend.db").display())
}

#[test]
fn version_reports_binary_name() {
    let home = TempDir::new().unwrap();
    let out = json_out(op(&home).arg("version"));
    assert_eq!(out["name"], "op");
    assert!(out["version"].is_string());
}

#[test]
fn tasks_persist_between_runs() {
    let home = TempDir::new().unwrap();

    let added = json_out(op(&home).args(["task", "add", "Write proposal", "-p", "high"]));
    assert_eq!(added["action"], "added");
    assert_eq!(added["task"]["priority"], "80");
    let id = added["task"]["id"].as_str().unwrap().to_string();

    json_out(op(&home).args(["task", "add", "Inbox zero", "-p", "20"]));

    let toggled = json_out(op(&home).args(["task", "toggle", &id]));
    assert_eq!(toggled["action"], "completed");
    assert_eq!(toggled["progress"]["total"], 50);
    assert_eq!(toggled["progress"]["p80"], 100);
    assert_eq!(toggled["progress"]["p20"], 0);

    let list = json_out(op(&home).args(["task", "list"]));
    assert_eq!(list["date"], "2024-05-20");
    assert_eq!(list["tasks"].as_array().unwrap().len(), 2);
}

#[test]
fn unknown_task_is_not_found() {
    let home = TempDir::new().unwrap();
    let err = json_err(op(&home).args(["task", "toggle", "task_missing"]), 3);
    assert_eq!(err["error"]["code"], "TASK_NOT_FOUND");
}

#[test]
fn today_commitments_round_trip() {
    let home = TempDir::new().unwrap();
    let set = json_out(op(&home).args(["today", "--intention", "Close the deal", "--sacrifice", "TV"]));
    assert_eq!(set["updated"], true);
    assert_eq!(set["source"], "local");

    let shown = json_out(op(&home).arg("today"));
    assert_eq!(shown["updated"], false);
    assert_eq!(shown["plan"]["intention"], "Close the deal");
    assert_eq!(shown["plan"]["sacrifice"], "TV");
    assert_eq!(shown["plan"]["comfortRefused"], "");
    assert_eq!(shown["currentBlock"]["id"], "3");
}

#[test]
fn current_block_follows_clock() {
    let home = TempDir::new().unwrap();
    let now = json_out(op(&home).args(["block", "now"]));
    assert_eq!(now["now"], "09:30");
    assert_eq!(now["block"]["label"], "80% - Revenue Generation");
    assert_eq!(now["block"]["phase"], "active");

    let late = json_out(op_at(&home, "2024-05-20T22:00").args(["block", "now"]));
    assert!(late["block"].is_null());
}

#[test]
fn block_must_end_after_start() {
    let home = TempDir::new().unwrap();
    let err = json_err(op(&home).args(["block", "add", "14:00", "13:00", "Backwards"]), 4);
    assert_eq!(err["error"]["code"], "INVALID_ARGUMENT");

    let added = json_out(op(&home).args(["block", "add", "4:30", "5:00", "Early run", "-p", "60"]));
    assert_eq!(added["block"]["startTime"], "04:30");
    let list = json_out(op(&home).args(["block", "list"]));
    assert_eq!(list["blocks"][0]["label"], "Early run");
}

#[test]
fn goals_filter_by_quarter() {
    let home = TempDir::new().unwrap();
    json_out(op(&home).args(["goal", "add", "Ship v1", "--type", "quarterly", "--quarter", "Q2"]));
    json_out(op(&home).args(["goal", "add", "Run a marathon"]));

    let q2 = json_out(op(&home).args(["goal", "list", "--quarter", "2"]));
    assert_eq!(q2["count"], 1);
    assert_eq!(q2["goals"][0]["name"], "Ship v1");

    let all = json_out(op(&home).args(["goal", "list"]));
    assert_eq!(all["count"], 2);
}

#[test]
fn operating_code_principles() {
    let home = TempDir::new().unwrap();
    let code = json_out(op(&home).args(["code", "add-principle", "Ship daily"]));
    let principles = code["operatingCode"]["principles"].as_array().unwrap();
    assert_eq!(principles.len(), 8);
    assert_eq!(principles[7], "Ship daily");

    let code = json_out(op(&home).args(["code", "remove-principle", "1"]));
    assert_eq!(code["operatingCode"]["principles"].as_array().unwrap().len(), 7);
}

#[test]
fn watch_once_announces_current_block() {
    let home = TempDir::new().unwrap();
    let out = json_out(op(&home).args(["watch", "--once", "--no-bell"]));
    assert_eq!(out["tag"], "block-3");
    assert_eq!(out["title"], "THE OPERATOR - Time Block Started");
}

#[test]
fn subscription_requires_sign_in() {
    let home = TempDir::new().unwrap();
    let err = json_err(op(&home).args(["subscription", "status"]), 2);
    assert_eq!(err["error"]["code"], "NOT_AUTHENTICATED");
}

#[test]
fn sign_in_needs_backend() {
    let home = TempDir::new().unwrap();
    let err = json_err(op(&home).args(["auth", "sign-in", "a@example.com", "--password", "secret1"]), 7);
    assert_eq!(err["error"]["code"], "CONFIG_ERROR");
}

#[test]
fn signed_in_planner_syncs_through_backend() {
    let home = TempDir::new().unwrap();
    let server = TempDir::new().unwrap();
    let url = backend_url(&server);

    let signed = json_out(op(&home).args([
        "--backend-url",
        &url,
        "auth",
        "sign-up",
        "op@example.com",
        "--password",
        "secret123",
    ]));
    assert_eq!(signed["authenticated"], true);
    assert_eq!(signed["email"], "op@example.com");

    json_out(op(&home).args(["task", "add", "Call investors"]));
    json_out(op(&home).args(["task", "add", "Send deck", "-p", "60"]));
    let code = json_out(op(&home).args(["code", "add-principle", "Ship daily"]));
    let principles = code["operatingCode"]["principles"].as_array().unwrap();
    assert_eq!(principles.last().unwrap(), "Ship daily");

    let status = json_out(op(&home).arg("status"));
    assert_eq!(status["source"], "remote");
    assert_eq!(status["sync"]["isOnline"], true);
    assert_eq!(status["progress"]["tasks"], 2);

    // Another device signing in to the same account sees the task.
    let other = TempDir::new().unwrap();
    json_out(op(&other).args([
        "--backend-url",
        &url,
        "auth",
        "sign-in",
        "op@example.com",
        "--password",
        "secret123",
    ]));
    let list = json_out(op(&other).args(["task", "list"]));
    assert_eq!(list["tasks"][0]["title"], "Call investors");

    let out = json_out(op(&home).args(["auth", "sign-out"]));
    assert_eq!(out["signedOut"], true);
    let status = json_out(op(&home).arg("status"));
    assert_eq!(status["source"], "local");
    assert_eq!(status["progress"]["tasks"], 0);
}

#[test]
fn completions_generate_for_bash() {
    let home = TempDir::new().unwrap();
    let output = op(&home).args(["completions", "bash"]).assert().success().get_output().stdout.clone();
    assert!(String::from_utf8(output).unwrap().contains("op"));
}
