use assert_cmd::prelude::*;
use predicates::prelude::*;
use pretty_assertions::assert_eq;
use serde_json::Value;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

const RECORDS: &str = r#"{"psgc_code": "0300000000", "name": "Region III (Central Luzon)", "geographic_level": "Reg"}
{"psgc_code": 301400000, "name": "Bulacan", "geographic_level": "Prov", "income_classification": "1st"}
{"psgc_code": "0301401000", "name": "Angat", "geographic_level": "Mun"}
{"psgc_code": "0301401007", "name": "Binagbag", "geographic_level": "Bgy", "urban_rural": "R", "population_2020": "3,045"}
{"psgc_code": "1300000000", "name": "National Capital Region (NCR)", "geographic_level": "Reg"}
{"psgc_code": "1380601000", "name": "City of Manila", "geographic_level": "City", "city_class": "HUC"}
{"psgc_code": "1380700000", "name": "Fourth District", "geographic_level": "Dist"}
"#;

fn psgc() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("psgc"));
    cmd.env_remove("PSGC_AUTH_TOKEN")
        .env_remove("PSGC_CONFIG")
        .env_remove("PSGC_SNAPSHOT");
    cmd
}

fn import(dir: &TempDir) -> std::path::PathBuf {
    let input = dir.path().join("psgc_data.jsonl");
    std::fs::write(&input, RECORDS).unwrap();
    let snapshot = dir.path().join("graph.json");

    let output = psgc()
        .arg("import")
        .arg(&input)
        .arg("--snapshot")
        .arg(&snapshot)
        .args(["--clear", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let stats: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(stats["records"], 7);
    assert_eq!(stats["skipped"], 1);
    assert_eq!(stats["inserted"]["Region"], 2);
    assert_eq!(stats["cleared"], true);
    snapshot
}

fn lookup(command: &str, code: &str, snapshot: &Path) -> (bool, Value) {
    let output = psgc()
        .args([command, code, "--snapshot"])
        .arg(snapshot)
        .output()
        .unwrap();
    (
        output.status.success(),
        serde_json::from_slice(&output.stdout).unwrap(),
    )
}

#[test]
fn import_then_resolve_hierarchy() {
    let dir = TempDir::new().unwrap();
    let snapshot = import(&dir);

    let (ok, body) = lookup("hierarchy", "0301401007", &snapshot);
    assert!(ok);
    assert_eq!(body["status"], "ok");
    let codes: Vec<_> = body["data"]["path"]
        .as_array()
        .unwrap()
        .iter()
        .map(|node| node["code"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(
        codes,
        vec!["0300000000", "0301400000", "0301401000", "0301401007"]
    );
    assert_eq!(body["data"]["path"][3]["population"], 3045);
    assert_eq!(body["data"]["path"][3]["attributes"]["urban_rural"], "R");

    let (ok, body) = lookup("hierarchy", "1380601000", &snapshot);
    assert!(ok);
    assert_eq!(body["data"]["path"].as_array().unwrap().len(), 2);
    assert_eq!(body["data"]["path"][1]["type"], "city");
}

#[test]
fn unknown_code_exits_non_zero_with_envelope() {
    let dir = TempDir::new().unwrap();
    let snapshot = import(&dir);

    let (ok, body) = lookup("hierarchy", "9999999999", &snapshot);
    assert!(!ok);
    assert_eq!(body["status"], "error");
    assert_eq!(body["error"]["code"], "not_found");

    let (ok, body) = lookup("node", "1380700000", &snapshot);
    assert!(!ok);
    assert_eq!(body["error"]["code"], "not_found");
}

#[test]
fn node_reports_neighbors() {
    let dir = TempDir::new().unwrap();
    let snapshot = import(&dir);

    let (ok, body) = lookup("node", "0301401000", &snapshot);
    assert!(ok);
    assert_eq!(body["data"]["node"]["type"], "municipality");
    assert_eq!(body["data"]["parents"][0]["relationship"], "HAS_CITY_MUNICIPALITY");
    assert_eq!(body["data"]["children"][0]["code"], "0301401007");
}

#[test]
fn missing_snapshot_is_store_unavailable() {
    let dir = TempDir::new().unwrap();
    let (ok, body) = lookup("hierarchy", "0300000000", &dir.path().join("none.json"));
    assert!(!ok);
    assert_eq!(body["error"]["code"], "store_unavailable");
}

#[test]
fn import_prints_text_summary_by_default() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("psgc_data.jsonl");
    std::fs::write(&input, RECORDS).unwrap();

    psgc()
        .arg("import")
        .arg(&input)
        .arg("--snapshot")
        .arg(dir.path().join("graph.json"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported 6 of 7 records"))
        .stdout(predicate::str::contains("HAS_PROVINCE (Region -> Province): 1 edges"))
        .stdout(predicate::str::contains("skipped: 1"));
}

#[test]
fn import_rejects_non_json_input() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("psgc.csv");
    std::fs::write(&input, "psgc_code,name\n0300000000,Region III\n").unwrap();

    psgc()
        .arg("import")
        .arg(&input)
        .arg("--snapshot")
        .arg(dir.path().join("graph.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Import of"));
}
