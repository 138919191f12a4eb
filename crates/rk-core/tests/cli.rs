//! CLI tests for the `rk` binary.
//!
//! Each subcommand is driven with a JSON document in a temp dir; the tests
//! check the JSON on stdout and the documented exit codes.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;
use tempfile::TempDir;

/// `rk` with the configuration pinned to built-in defaults.
fn rk(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("rk").expect("rk binary should exist");
    cmd.env_remove("RAMKIT_CONFIG")
        .env_remove("RAMKIT_CONFIG_DIR")
        .env_remove("RK_LOG")
        .env_remove("RUST_LOG")
        .env("XDG_CONFIG_HOME", home.path());
    cmd
}

fn write(dir: &TempDir, name: &str, body: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, body).expect("write input");
    path
}

// ============================================================================
// Subcommands
// ============================================================================

mod subcommands {
    use super::*;

    #[test]
    fn survival_exponential_fit() {
        let dir = TempDir::new().unwrap();
        let input = write(
            &dir,
            "dataset.json",
            r#"{
                "distribution": "exponential",
                "records": [
                    {"unit": "A", "right": 120.0, "status": "event"},
                    {"unit": "B", "right": 340.0, "status": "event"},
                    {"unit": "C", "right": 95.0, "status": "event"},
                    {"unit": "D", "right": 500.0, "status": "right_censored"}
                ]
            }"#,
        );
        rk(&dir)
            .arg("survival")
            .arg(&input)
            .assert()
            .success()
            .stdout(predicate::str::contains("\"mtbf\"").and(predicate::str::contains("\"n_failures\": 3")));
    }

    #[test]
    fn predict_rolls_up_tree() {
        let dir = TempDir::new().unwrap();
        let input = write(
            &dir,
            "tree.json",
            r#"[
                {"id": 1, "name": "system"},
                {"id": 2, "parent_id": 1, "name": "relay",
                 "part": {"category_id": 6, "subcategory_id": 2, "method": "parts_count"}},
                {"id": 3, "parent_id": 1, "name": "bought-in",
                 "failure_rate_type": "specified_mtbf", "specified_mtbf": 10000.0}
            ]"#,
        );
        rk(&dir)
            .arg("predict")
            .arg(&input)
            .assert()
            .success()
            .stdout(
                predicate::str::contains("\"summary\"")
                    .and(predicate::str::contains("\"predicted_parts\": 1"))
                    .and(predicate::str::contains("failure_rate_predicted")),
            );
    }

    #[test]
    fn allocate_equal() {
        let dir = TempDir::new().unwrap();
        let input = write(
            &dir,
            "allocation.json",
            r#"{
                "method": "equal",
                "operating_time": 100.0,
                "goal": {"reliability": 0.9},
                "nodes": [{"id": 2}, {"id": 3}]
            }"#,
        );
        rk(&dir)
            .arg("allocate")
            .arg(&input)
            .assert()
            .success()
            .stdout(predicate::str::contains("\"percent_weight\": 50.0"));
    }

    #[test]
    fn allocate_from_tree() {
        let dir = TempDir::new().unwrap();
        let input = write(
            &dir,
            "allocation.json",
            r#"{
                "method": "arinc",
                "operating_time": 100.0,
                "goal": {"hazard_rate": 0.0001},
                "tree": [
                    {"id": 1, "name": "system"},
                    {"id": 2, "parent_id": 1, "failure_rate_type": "specified_hazard_rate",
                     "specified_hazard_rate": 0.375},
                    {"id": 3, "parent_id": 1, "failure_rate_type": "specified_hazard_rate",
                     "specified_hazard_rate": 0.125}
                ]
            }"#,
        );
        rk(&dir)
            .arg("allocate")
            .arg(&input)
            .assert()
            .success()
            .stdout(predicate::str::contains("\"weight\": 0.75"));
    }

    #[test]
    fn fmea_rpn() {
        let dir = TempDir::new().unwrap();
        let input = write(
            &dir,
            "fmea.json",
            r#"{
                "item_hazard_rate": 0.0002,
                "modes": [{
                    "severity_class": "II",
                    "mode_ratio": 1.0,
                    "operating_time": 5.0,
                    "rpn_severity": 8,
                    "mechanisms": [{"rpn_occurrence": 4, "rpn_detection": 2, "rpn_detection_new": 1}]
                }]
            }"#,
        );
        rk(&dir)
            .arg("fmea")
            .arg(&input)
            .assert()
            .success()
            .stdout(
                predicate::str::contains("\"rpn\": 64")
                    .and(predicate::str::contains("\"rpn_new\": 32"))
                    .and(predicate::str::contains("II: ")),
            );
    }

    #[test]
    fn growth_plan_idealized() {
        let dir = TempDir::new().unwrap();
        let input = write(
            &dir,
            "plan.json",
            r#"{"mtbf_initial": 50.0, "growth_start": 500.0, "growth_rate": 0.3, "total_time": 10000.0}"#,
        );
        rk(&dir)
            .args(["growth-plan", "--points", "5"])
            .arg(&input)
            .assert()
            .success()
            .stdout(predicate::str::contains("\"mtbf_final\"").and(predicate::str::contains("\"curve\"")));
    }

    #[test]
    fn similar_item_from_stdin() {
        let dir = TempDir::new().unwrap();
        rk(&dir)
            .args(["similar-item", "-"])
            .write_stdin(r#"{"hazard_rate": 2.0, "factors": [1.5], "functions": ["hr * pi1", "res1 + 1"]}"#)
            .assert()
            .success()
            .stdout(predicate::str::contains("3.0").and(predicate::str::contains("4.0")));
    }

    #[test]
    fn config_show_reports_defaults() {
        let dir = TempDir::new().unwrap();
        rk(&dir)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("builtin default").and(predicate::str::contains("\"tables\"")));
    }

    #[test]
    fn config_validate_partial_file() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "config.json", r#"{"prediction": {"rate_multiplier": 1000.0}}"#);
        rk(&dir)
            .args(["config", "validate"])
            .arg(&path)
            .assert()
            .success()
            .stdout(predicate::str::contains("\"status\": \"valid\""));
    }
}

// ============================================================================
// Exit codes
// ============================================================================

mod exit_codes {
    use super::*;

    #[test]
    fn unknown_command_is_args_error() {
        let dir = TempDir::new().unwrap();
        rk(&dir)
            .arg("nonexistent-command")
            .assert()
            .code(10)
            .stderr(predicate::str::contains("error"));
    }

    #[test]
    fn missing_input_is_io_error() {
        let dir = TempDir::new().unwrap();
        rk(&dir)
            .arg("survival")
            .arg(dir.path().join("absent.json"))
            .assert()
            .code(21);
    }

    #[test]
    fn malformed_json_is_input_error() {
        let dir = TempDir::new().unwrap();
        let input = write(&dir, "bad.json", r#"{"distribution": "exponential", "records": [{"unit": "A", "right": "soon"}]}"#);
        rk(&dir).arg("survival").arg(&input).assert().code(11);
    }

    #[test]
    fn environment_out_of_table_is_config_error() {
        let dir = TempDir::new().unwrap();
        let input = write(
            &dir,
            "tree.json",
            r#"[{"id": 1, "name": "relay", "environment_active": 15,
                 "part": {"category_id": 6, "subcategory_id": 2}}]"#,
        );
        rk(&dir).arg("predict").arg(&input).assert().code(12);
    }

    #[test]
    fn invalid_config_is_config_error() {
        let dir = TempDir::new().unwrap();
        let config = write(&dir, "config.json", r#"{"prediction": {"rate_multiplier": -1.0}}"#);
        let input = write(&dir, "si.json", r#"{"functions": ["hr"]}"#);
        rk(&dir)
            .arg("--config")
            .arg(&config)
            .arg("similar-item")
            .arg(&input)
            .assert()
            .code(12);
    }

    #[test]
    fn jsonl_errors_are_structured() {
        let dir = TempDir::new().unwrap();
        let input = write(&dir, "si.json", r#"{"functions": ["hr +"]}"#);
        rk(&dir)
            .args(["--log-format", "jsonl", "similar-item"])
            .arg(&input)
            .assert()
            .code(11)
            .stderr(predicate::str::contains("\"code\":"));
    }
}
