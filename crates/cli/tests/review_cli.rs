// Integration tests for the fcheck review workflow.
// Run with: cargo test -p fieldcheck-cli --test review_cli -- --nocapture

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use calamine::{open_workbook_auto, Data, Reader};
use tempfile::TempDir;

const HEADER: &str = "Project Id,Raised Evidence,Latest Evidence,Zone,Ward,Organisation,Raised Comment";

/// Each test gets its own upload, side file and config home.
struct Fixture {
    dir: TempDir,
}

impl Fixture {
    /// 12 rows: P1..P7 in North, P8..P12 in South.
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let mut csv = String::from(HEADER);
        csv.push('\n');
        for i in 1..=12 {
            let zone = if i <= 7 { "North" } else { "South" };
            let ward = if i % 2 == 0 { "12" } else { "4" };
            csv.push_str(&format!(
                "P{i},https://img/b{i}.jpg,https://img/a{i}.jpg,{zone},{ward},Roads Dept,\"pothole\nnear gate\"\n"
            ));
        }
        std::fs::write(dir.path().join("ward.csv"), csv).unwrap();
        Self { dir }
    }

    fn data(&self) -> PathBuf {
        self.dir.path().join("ward.csv")
    }

    fn store(&self) -> PathBuf {
        self.dir.path().join("ward.verdicts.json")
    }

    fn fcheck(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_fcheck"))
            .args(args)
            .env("XDG_CONFIG_HOME", self.dir.path().join("config"))
            .env_remove("FCHECK_CONFIG")
            .env_remove("RUST_LOG")
            .current_dir(self.dir.path())
            .output()
            .expect("run fcheck")
    }

    /// Run against the fixture upload: `fcheck <cmd> ward.csv <rest...>`.
    fn run(&self, cmd: &str, rest: &[&str]) -> Output {
        let data = self.data();
        let mut args = vec![cmd, data.to_str().unwrap()];
        args.extend_from_slice(rest);
        self.fcheck(&args)
    }

    fn json(&self, cmd: &str, rest: &[&str]) -> serde_json::Value {
        let mut rest = rest.to_vec();
        rest.push("--json");
        let out = self.run(cmd, &rest);
        assert!(
            out.status.success(),
            "fcheck {cmd} failed: {}",
            String::from_utf8_lossy(&out.stderr)
        );
        serde_json::from_slice(&out.stdout).expect("valid JSON")
    }

    fn stored(&self) -> serde_json::Value {
        serde_json::from_str(&std::fs::read_to_string(self.store()).unwrap()).unwrap()
    }
}

fn code(out: &Output) -> i32 {
    out.status.code().unwrap_or(-1)
}

fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}

fn read_sheet(path: &Path) -> Vec<Vec<String>> {
    let mut wb = open_workbook_auto(path).unwrap();
    let range = wb.worksheet_range("Approval Data").unwrap();
    range
        .rows()
        .map(|row| {
            row.iter()
                .map(|c| match c {
                    Data::String(s) => s.clone(),
                    Data::Empty => String::new(),
                    other => other.to_string(),
                })
                .collect()
        })
        .collect()
}

// ---------------------------------------------------------------------------
// check / options / reasons
// ---------------------------------------------------------------------------

#[test]
fn check_reports_load() {
    let fx = Fixture::new();
    let report = fx.json("check", &[]);
    assert_eq!(report["report"]["rows_loaded"], 12);
    assert_eq!(report["report"]["delimiter"], ",");
    assert_eq!(report["id_column"], "Project Id");
    assert_eq!(report["stored_verdicts"], 0);
    // check never writes the side file
    assert!(!fx.store().exists());
}

#[test]
fn missing_required_column_exits_4() {
    let fx = Fixture::new();
    let path = fx.dir.path().join("thin.csv");
    std::fs::write(&path, "Project Id,Zone\nP1,North\n").unwrap();
    let out = fx.fcheck(&["check", path.to_str().unwrap()]);
    assert_eq!(code(&out), 4);
    let err = stderr(&out);
    assert!(err.contains("Latest Evidence"), "{err}");
    assert!(err.contains("Ward"), "{err}");
}

#[test]
fn unreadable_upload_exits_3() {
    let fx = Fixture::new();
    let out = fx.fcheck(&["check", "photos.zip"]);
    assert_eq!(code(&out), 3);
    let out = fx.fcheck(&["check", "absent.csv"]);
    assert_eq!(code(&out), 3);
}

#[test]
fn options_list_distinct_values() {
    let fx = Fixture::new();
    let options = fx.json("options", &[]);
    let zones = options["Zone"]["values"].as_array().unwrap();
    assert_eq!(zones.len(), 3);
    assert_eq!(zones[0]["value"], "All");
    assert_eq!(zones[0]["count"], 12);
    assert_eq!(zones[1]["value"], "North");
    assert_eq!(zones[1]["count"], 7);
    assert_eq!(zones[2]["value"], "South");
    assert_eq!(options["Organisation"]["present"], true);
}

#[test]
fn reasons_lists_defaults() {
    let fx = Fixture::new();
    let out = fx.fcheck(&["reasons"]);
    assert!(out.status.success());
    let text = String::from_utf8_lossy(&out.stdout);
    assert_eq!(text.lines().count(), 4);
    assert!(text.contains("Wrong Before Image/Poor Identification"));
    assert!(text.contains("Incomplete Work/Work Not Started"));
}

// ---------------------------------------------------------------------------
// page: paging, filters, saved cursor
// ---------------------------------------------------------------------------

#[test]
fn pages_of_ten_with_saved_cursor() {
    let fx = Fixture::new();

    let first = fx.json("page", &[]);
    assert_eq!(first["page"]["page"], 0);
    assert_eq!(first["page"]["page_count"], 2);
    assert_eq!(first["rows"].as_array().unwrap().len(), 10);
    assert_eq!(first["rows"][0]["label"], "Not Yet Updated");

    let second = fx.json("page", &["--next"]);
    assert_eq!(second["page"]["page"], 1);
    assert_eq!(second["page"]["start"], 11);
    assert_eq!(second["rows"].as_array().unwrap().len(), 2);

    // --next on the last page stays put
    let still = fx.json("page", &["--next"]);
    assert_eq!(still["page"]["page"], 1);

    // No flags resumes the saved page
    let resumed = fx.json("page", &[]);
    assert_eq!(resumed["page"]["page"], 1);
    assert_eq!(fx.stored()["cursor"]["page"], 1);
}

#[test]
fn repeated_filter_flag_keeps_paging() {
    let fx = Fixture::new();
    let mut csv = String::from(HEADER);
    csv.push('\n');
    for i in 1..=35 {
        csv.push_str(&format!("P{i},b.jpg,a.jpg,North,4,Roads Dept,\n"));
    }
    std::fs::write(fx.data(), csv).unwrap();

    let pages: Vec<u64> = (0..3)
        .map(|_| fx.json("page", &["--zone", "North", "--next"])["page"]["page"].as_u64().unwrap())
        .collect();
    assert_eq!(pages, vec![1, 2, 3]);
}

#[test]
fn filter_change_resets_page() {
    let fx = Fixture::new();
    fx.json("page", &["--next"]);

    let south = fx.json("page", &["--zone", "South"]);
    assert_eq!(south["page"]["page"], 0);
    assert_eq!(south["page"]["total"], 5);
    assert_eq!(south["filters"]["Zone"], "South");

    // Filters combine and persist across invocations
    let narrowed = fx.json("page", &["--ward", "12"]);
    assert_eq!(narrowed["page"]["total"], 3);
    let ids: Vec<&str> = narrowed["rows"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["P8", "P10", "P12"]);

    let cleared = fx.json("page", &["--clear"]);
    assert_eq!(cleared["page"]["total"], 12);
}

#[test]
fn page_number_clamps_and_zero_is_rejected() {
    let fx = Fixture::new();
    let far = fx.json("page", &["--page", "99"]);
    assert_eq!(far["page"]["page"], 1);

    let out = fx.run("page", &["--page", "0"]);
    assert_eq!(code(&out), 2);
}

#[test]
fn unknown_filter_column_is_usage_error() {
    let fx = Fixture::new();
    let out = fx.run("page", &["--filter", "City=Pune"]);
    assert_eq!(code(&out), 2);
    assert!(stderr(&out).contains("City"));
}

#[test]
fn page_text_collapses_multiline_comments() {
    let fx = Fixture::new();
    let out = fx.run("page", &["--zone", "South"]);
    assert!(out.status.success());
    let text = String::from_utf8_lossy(&out.stdout);
    assert!(text.contains("page 1/1"), "{text}");
    assert!(text.contains("Zone=South"), "{text}");
    assert!(text.contains("P12"));
    assert!(!text.contains("P1 "));
}

// ---------------------------------------------------------------------------
// mark
// ---------------------------------------------------------------------------

#[test]
fn mark_persists_verdicts() {
    let fx = Fixture::new();
    assert!(fx.run("mark", &["P1", "correct"]).status.success());
    let out = fx.run("mark", &["P2", "Incorrect", "--reason", "after photo-missing"]);
    assert!(out.status.success(), "{}", stderr(&out));
    assert!(String::from_utf8_lossy(&out.stdout).contains("After Photo-Missing"));

    let stored = fx.stored();
    assert_eq!(stored["version"], 1);
    assert_eq!(stored["verdicts"]["P1"]["verdict"], "correct");
    assert_eq!(stored["verdicts"]["P2"]["verdict"], "incorrect");
    assert_eq!(stored["verdicts"]["P2"]["reason"], "After Photo-Missing");
    assert!(stored["verdicts"]["P2"]["updated_at"].is_string());

    let page = fx.json("page", &[]);
    assert_eq!(page["rows"][0]["label"], "Correct");
    assert_eq!(page["rows"][1]["reason"], "After Photo-Missing");
}

#[test]
fn mark_validation_exit_codes() {
    let fx = Fixture::new();

    let out = fx.run("mark", &["P1", "incorrect"]);
    assert_eq!(code(&out), 6);
    assert!(stderr(&out).contains("fcheck reasons"));

    assert_eq!(code(&fx.run("mark", &["P1", "correct", "--reason", "After Photo-Missing"])), 6);
    assert_eq!(code(&fx.run("mark", &["P1", "incorrect", "--reason", "Bad vibes"])), 6);
    assert_eq!(code(&fx.run("mark", &["P1", "approved"])), 6);

    let out = fx.run("mark", &["P99", "correct"]);
    assert_eq!(code(&out), 7);
    assert!(stderr(&out).contains("Project Id"));

    // Nothing was written by the failed attempts
    assert!(!fx.store().exists());
}

#[test]
fn revert_clears_entry() {
    let fx = Fixture::new();
    fx.run("mark", &["P3", "not reviewed"]);
    assert_eq!(fx.stored()["verdicts"]["P3"]["verdict"], "not_reviewed");

    let out = fx.run("mark", &["P3", "not_yet_updated"]);
    assert!(out.status.success());
    assert_eq!(fx.stored()["verdicts"]["P3"]["verdict"], "not_yet_updated");
    assert!(fx.stored()["verdicts"]["P3"].get("reason").is_none());

    let summary = fx.json("summary", &[]);
    assert_eq!(summary["counts"][0]["count"], 12);
    assert_eq!(fx.json("check", &[])["orphaned_verdicts"], 0);
}

#[test]
fn revert_on_reexported_sheet_sticks() {
    let fx = Fixture::new();
    fx.run("mark", &["P2", "correct"]);
    let round = fx.dir.path().join("round.xlsx");
    fx.json("export", &["--all-columns", "-o", round.to_str().unwrap()]);

    // round.xlsx gets its own side file, seeded from its Quality column
    let round_arg = round.to_str().unwrap();
    let out = fx.fcheck(&["mark", round_arg, "P2", "not_yet_updated"]);
    assert!(out.status.success(), "{}", stderr(&out));

    let out = fx.fcheck(&["summary", round_arg, "--json"]);
    assert!(out.status.success(), "{}", stderr(&out));
    let summary: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(summary["counts"][2]["label"], "Correct");
    assert_eq!(summary["counts"][2]["count"], 0);
    assert_eq!(summary["counts"][0]["count"], 12);
}

#[test]
fn check_flags_stored_verdicts_missing_a_reason() {
    let fx = Fixture::new();
    std::fs::write(
        fx.store(),
        r#"{"version": 1, "verdicts": {"P1": {"verdict": "incorrect"}, "P2": {"verdict": "correct"}}}"#,
    )
    .unwrap();
    let report = fx.json("check", &[]);
    assert_eq!(report["invalid_verdicts"], serde_json::json!(["P1"]));
    assert_eq!(report["distinct_ids"], 12);
}

#[test]
fn verdicts_survive_reupload_without_their_rows() {
    let fx = Fixture::new();
    fx.run("mark", &["P12", "correct"]);

    // New batch drops P12 and reorders the rest
    let mut csv = String::from(HEADER);
    csv.push('\n');
    for i in (1..=11).rev() {
        csv.push_str(&format!("P{i},b.jpg,a.jpg,North,4,Roads Dept,\n"));
    }
    std::fs::write(fx.data(), csv).unwrap();

    fx.run("mark", &["P5", "correct"]);
    let stored = fx.stored();
    assert_eq!(stored["verdicts"]["P12"]["verdict"], "correct");
    assert_eq!(stored["verdicts"]["P5"]["verdict"], "correct");

    let report = fx.json("check", &[]);
    assert_eq!(report["orphaned_verdicts"], 1);
}

// ---------------------------------------------------------------------------
// summary
// ---------------------------------------------------------------------------

#[test]
fn summary_counts_filtered_rows() {
    let fx = Fixture::new();
    fx.run("mark", &["P1", "correct"]);
    fx.run("mark", &["P8", "correct"]);
    fx.run("mark", &["P9", "incorrect", "-r", "After Photo-Wrong/Blurry"]);

    let all = fx.json("summary", &[]);
    assert_eq!(all["total"], 12);
    assert_eq!(all["counts"][0]["label"], "Not Yet Updated");
    assert_eq!(all["counts"][0]["count"], 9);
    assert_eq!(all["counts"][2]["count"], 2);

    let south = fx.json("summary", &["--zone", "South"]);
    assert_eq!(south["total"], 5);
    assert_eq!(south["counts"][2]["count"], 1);
    assert_eq!(south["counts"][3]["count"], 1);
    assert_eq!(south["counts"][3]["percent"], 20.0);
    assert_eq!(south["accuracy"], 50.0);
    assert_eq!(south["reasons"]["After Photo-Wrong/Blurry"], 1);
    assert_eq!(south["filters"]["Zone"], "South");
}

// ---------------------------------------------------------------------------
// export
// ---------------------------------------------------------------------------

#[test]
fn export_writes_default_file() {
    let fx = Fixture::new();
    fx.run("mark", &["P1", "correct"]);
    fx.run("mark", &["P2", "incorrect", "--reason", "Incomplete Work/Work Not Started"]);

    let result = fx.json("export", &[]);
    assert_eq!(result["rows_written"], 12);
    assert_eq!(result["green_rows"], 1);
    assert_eq!(result["red_rows"], 1);

    let out = fx.dir.path().join("updated_approval_data.xlsx");
    assert!(out.exists());
    let rows = read_sheet(&out);
    assert_eq!(rows.len(), 13);
    let header = &rows[0];
    assert_eq!(header.first().map(String::as_str), Some("Project Id"));
    assert_eq!(&header[header.len() - 2..], ["Quality", "Comments"]);
    // Configured order, not upload order
    let zone = header.iter().position(|h| h == "Zone").unwrap();
    let raised = header.iter().position(|h| h == "Raised Evidence").unwrap();
    assert!(zone < raised);
    assert_eq!(rows[1][header.len() - 2], "Correct");
    assert_eq!(rows[2][header.len() - 1], "Incomplete Work/Work Not Started");
    assert_eq!(rows[3][header.len() - 2], "Not Yet Updated");
}

#[test]
fn export_filtered_scope_and_all_columns() {
    let fx = Fixture::new();
    let target = fx.dir.path().join("south.xlsx");
    let result = fx.json(
        "export",
        &["--zone", "South", "--filtered", "--all-columns", "-o", target.to_str().unwrap()],
    );
    assert_eq!(result["rows_written"], 5);
    assert_eq!(result["scope"], "filtered");

    let rows = read_sheet(&target);
    assert_eq!(rows.len(), 6);
    assert!(rows[0].iter().any(|h| h == "Raised Comment"));
    assert_eq!(rows[1][0], "P8");
}

#[test]
fn export_refuses_to_overwrite_upload() {
    let fx = Fixture::new();
    let data = fx.data();
    let out = fx.run("export", &["-o", data.to_str().unwrap()]);
    assert_eq!(code(&out), 2);

    // Same file, spelled relative to the working directory
    let out = fx.run("export", &["-o", "./ward.csv"]);
    assert_eq!(code(&out), 2);
    let upload = std::fs::read_to_string(&data).unwrap();
    assert!(upload.starts_with("Project Id"));
}

#[test]
fn export_of_reexported_sheet_picks_another_name() {
    let fx = Fixture::new();
    fx.run("mark", &["P1", "correct"]);
    fx.json("export", &[]);

    let upload = fx.dir.path().join("updated_approval_data.xlsx");
    let out = fx.fcheck(&["export", upload.to_str().unwrap()]);
    assert!(out.status.success(), "{}", stderr(&out));

    let second = fx.dir.path().join("updated_approval_data.reviewed.xlsx");
    assert!(second.exists());
    let rows = read_sheet(&second);
    assert_eq!(rows.len(), 13);
    // The re-uploaded sheet still opens as a workbook
    assert_eq!(read_sheet(&upload).len(), 13);
}

#[test]
fn reexported_sheet_seeds_verdicts() {
    let fx = Fixture::new();
    fx.run("mark", &["P4", "incorrect", "--reason", "After Photo-Missing"]);
    let exported = fx.dir.path().join("round.xlsx");
    fx.json("export", &["--all-columns", "-o", exported.to_str().unwrap()]);

    // A fresh side file, reading the exported sheet back in
    let store = fx.dir.path().join("fresh.verdicts.json");
    let out = fx.fcheck(&[
        "summary",
        exported.to_str().unwrap(),
        "--store",
        store.to_str().unwrap(),
        "--json",
    ]);
    assert!(out.status.success(), "{}", stderr(&out));
    let summary: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(summary["counts"][3]["count"], 1);
    assert_eq!(summary["reasons"]["After Photo-Missing"], 1);
}

// ---------------------------------------------------------------------------
// side file and profile errors
// ---------------------------------------------------------------------------

#[test]
fn newer_store_version_exits_5() {
    let fx = Fixture::new();
    std::fs::write(fx.store(), r#"{"version": 7, "verdicts": {}}"#).unwrap();
    let out = fx.run("page", &[]);
    assert_eq!(code(&out), 5);
    assert!(stderr(&out).contains("version 7"));
}

#[test]
fn invalid_profile_exits_9() {
    let fx = Fixture::new();
    let profile = fx.dir.path().join("profile.toml");
    std::fs::write(&profile, "page_size = 0\n").unwrap();
    let out = fx.run("page", &["--config", profile.to_str().unwrap()]);
    assert_eq!(code(&out), 9);
}

#[test]
fn profile_page_size_applies() {
    let fx = Fixture::new();
    let profile = fx.dir.path().join("profile.toml");
    std::fs::write(&profile, "page_size = 5\n").unwrap();
    let page = fx.json("page", &["--config", profile.to_str().unwrap()]);
    assert_eq!(page["page"]["page_count"], 3);
    assert_eq!(page["rows"].as_array().unwrap().len(), 5);
}

#[test]
fn default_profile_location_is_used() {
    let fx = Fixture::new();
    let dir = fx.dir.path().join("config").join("fieldcheck");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("profile.toml"), "disapproval_reasons = [\"Blurry\"]\n").unwrap();

    let out = fx.fcheck(&["reasons"]);
    assert!(out.status.success());
    let text = String::from_utf8_lossy(&out.stdout);
    // dirs honours XDG_CONFIG_HOME on Linux only
    if cfg!(target_os = "linux") {
        assert_eq!(text.trim(), "1. Blurry");
    }
}
