use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use serde_json::Value;
use tempfile::TempDir;

const CATALOG: &str = r#"[
  {"id": "pi-amerika-ii", "name": "VDJ Amerika II", "okres": "PI", "kategorie": "I.", "oploceni_bm": 293, "vymra_m2": 3303, "gps": [49.02671, 13.994001]},
  {"id": "cb-hlavatce", "name": "VDJ Hlavatce", "okres": "CB", "kategorie": null, "oploceni_bm": 424, "vymra_m2": 7968, "gps": [49.035, 14.04]},
  {"id": "pt-ptacnik", "name": "VDJ Ptáčník", "okres": "PT", "kategorie": "II.", "oploceni_bm": 239, "vymra_m2": 1070, "gps": [49.05, 14.115]}
]"#;

struct TestEnv {
    _tmp: TempDir,
    config: PathBuf,
}

impl TestEnv {
    fn new() -> Self {
        let tmp = TempDir::new().expect("create temp dir");
        let catalog = tmp.path().join("arealy.json");
        fs::write(&catalog, CATALOG).expect("write catalog");
        let config = write_config(tmp.path(), &catalog);
        Self { _tmp: tmp, config }
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("areal").expect("areal binary");
        cmd.env_remove("AREAL_CATALOG")
            .env_remove("AREAL_STORE")
            .arg("--config")
            .arg(&self.config);
        cmd
    }

    fn run_json(&self, args: &[&str]) -> Value {
        let out = self
            .cmd()
            .arg("--json")
            .args(args)
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        serde_json::from_slice(&out).expect("valid json output")
    }
}

fn write_config(dir: &Path, catalog: &Path) -> PathBuf {
    let config = dir.join("areal.json");
    let body = serde_json::json!({
        "catalog": catalog,
        "storage": {"backend": "file", "path": dir.join("storage.json")},
    });
    fs::write(&config, body.to_string()).expect("write config");
    config
}

#[test]
fn list_filters_by_district() {
    let env = TestEnv::new();
    let out = env.run_json(&["list", "--district", "PT"]);
    assert_eq!(out["ok"], true);
    let sites = out["data"].as_array().unwrap();
    assert_eq!(sites.len(), 1);
    assert_eq!(sites[0]["id"], "pt-ptacnik");
}

#[test]
fn stats_for_unclassified_category() {
    let env = TestEnv::new();
    let out = env.run_json(&["stats", "--category", ""]);
    assert_eq!(out["data"]["count"], 1);
    assert_eq!(out["data"]["totalArea"], 7968.0);
}

#[test]
fn route_persists_between_invocations() {
    let env = TestEnv::new();
    env.cmd()
        .args(["route", "add", "pt-ptacnik", "cb-hlavatce"])
        .assert()
        .success();

    let out = env.run_json(&["route", "show"]);
    let stops = out["data"]["stops"].as_array().unwrap();
    assert_eq!(stops.len(), 2);
    assert_eq!(stops[0]["id"], "pt-ptacnik");
    assert_eq!(out["data"]["summary"]["stops"], 2);

    let out = env.run_json(&["route", "export"]);
    assert_eq!(
        out["data"],
        "https://www.google.com/maps/dir/49.05,14.115/49.035,14.04"
    );

    env.cmd().args(["route", "clear"]).assert().success();
    env.cmd().args(["route", "export"]).assert().failure();
}

#[test]
fn unknown_site_fails() {
    let env = TestEnv::new();
    env.cmd().args(["route", "add", "nope"]).assert().failure();
    let out = env.run_json(&["route", "show"]);
    assert!(out["data"]["stops"].as_array().unwrap().is_empty());
}

#[test]
fn missing_catalog_still_runs() {
    let tmp = TempDir::new().unwrap();
    let config = write_config(tmp.path(), &tmp.path().join("missing.json"));
    let out = Command::cargo_bin("areal")
        .unwrap()
        .env_remove("AREAL_CATALOG")
        .env_remove("AREAL_STORE")
        .arg("--config")
        .arg(&config)
        .args(["--json", "list"])
        .assert()
        .success()
        .get_output()
        .clone();
    let value: Value = serde_json::from_slice(&out.stdout).unwrap();
    assert!(value["data"].as_array().unwrap().is_empty());
    assert!(String::from_utf8_lossy(&out.stderr).contains("[error]"));
}

#[test]
fn ask_answers_from_builtin_table() {
    let env = TestEnv::new();
    let out = env.run_json(&["ask", "jaký", "olej?"]);
    assert!(out["data"].as_str().unwrap().contains("10W-30"));
}

#[test]
fn navigate_to_single_site() {
    let env = TestEnv::new();
    let out = env.run_json(&["navigate", "cb-hlavatce"]);
    assert_eq!(
        out["data"],
        "https://www.google.com/maps/dir/?api=1&destination=49.035,14.04"
    );
    env.cmd().args(["navigate", "nope"]).assert().failure();
}

#[test]
fn route_help_describes_subcommands() {
    let env = TestEnv::new();
    let out = env
        .cmd()
        .args(["route", "--help"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let help = String::from_utf8_lossy(&out);
    for line in ["List stops in visit order", "Append sites by id", "Remove one stop", "Remove every stop"] {
        assert!(help.contains(line), "missing '{}' in:\n{}", line, help);
    }
}
