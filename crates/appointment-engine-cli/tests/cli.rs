use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;

/// 2026-01-12 09:00 in New York (EST, UTC-5).
const MORNING: &str = "2026-01-12T14:00:00Z";

const STORE: &str = r#"[
  {"id": 4, "title": "Kickoff", "type": "Planning",
   "start": "2026-01-12T15:30:00Z", "end": "2026-01-12T16:30:00Z",
   "customer_id": 1, "user_id": 1, "contact_id": 2},
  {"id": 9, "title": "Retro",
   "start": "2026-01-12T20:00:00Z", "end": "2026-01-12T21:00:00Z"}
]"#;

fn apptcheck() -> Command {
    let mut cmd = Command::cargo_bin("apptcheck").unwrap();
    cmd.env_remove("TZ")
        .env_remove("APPT_BUSINESS_TZ")
        .env_remove("APPT_OPERATOR_TZ")
        .env_remove("RUST_LOG");
    cmd
}

fn stdout_json(output: &std::process::Output) -> Value {
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn check_accepts_free_slot_in_hours() {
    let output = apptcheck()
        .args(["check", "--start", "2026-01-12T10:00", "--end", "2026-01-12T11:00"])
        .args(["--now", MORNING])
        .output()
        .unwrap();

    assert!(output.status.success());
    let verdict = stdout_json(&output);
    assert_eq!(verdict["status"], "accepted");
    assert_eq!(verdict["start"], "2026-01-12T15:00:00+00:00");
    assert_eq!(verdict["end"], "2026-01-12T16:00:00+00:00");
}

#[test]
fn check_rejects_after_closing() {
    apptcheck()
        .args(["check", "--start", "2026-01-12T21:30", "--end", "2026-01-12T22:30"])
        .args(["--now", MORNING])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("outside_business_hours"));
}

#[test]
fn check_accepts_appointment_ending_at_closing() {
    apptcheck()
        .args(["check", "--start", "2026-01-12T21:00", "--end", "2026-01-12T22:00"])
        .args(["--now", MORNING])
        .assert()
        .success();
}

#[test]
fn check_rejects_past_start() {
    apptcheck()
        .args(["check", "--start", "2026-01-12T08:30", "--end", "2026-01-12T09:30"])
        .args(["--now", MORNING])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("not_in_future"));
}

#[test]
fn check_does_not_limit_length() {
    // Three hours is past the interactive limit but still a valid booking
    apptcheck()
        .args(["check", "--start", "2026-01-12T10:00", "--end", "2026-01-12T13:00"])
        .args(["--now", "2026-01-12T13:00:00Z"])
        .assert()
        .success()
        .stdout(predicate::str::contains("accepted"));
}

#[test]
fn check_rejects_end_before_start() {
    apptcheck()
        .args(["check", "--start", "2026-01-12T11:00", "--end", "2026-01-12T10:00"])
        .args(["--now", MORNING])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("empty_interval"));
}

#[test]
fn check_reports_conflicting_appointment_from_stdin_store() {
    let output = apptcheck()
        .args(["check", "--start", "2026-01-12T10:00", "--end", "2026-01-12T11:00"])
        .args(["--now", MORNING, "--store", "-"])
        .write_stdin(STORE)
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let verdict = stdout_json(&output);
    assert_eq!(verdict["reason"], "conflict");
    assert_eq!(verdict["conflict"]["id"], 4);
    assert_eq!(verdict["conflict"]["title"], "Kickoff");
}

#[test]
fn check_back_to_back_with_stored_appointment_is_accepted() {
    apptcheck()
        .args(["check", "--start", "2026-01-12T09:30", "--end", "2026-01-12T10:30"])
        .args(["--now", MORNING, "--store", "-"])
        .write_stdin(STORE)
        .assert()
        .success()
        .stdout(predicate::str::contains("accepted"));
}

#[test]
fn check_excluding_edited_appointment_is_accepted() {
    apptcheck()
        .args(["check", "--start", "2026-01-12T10:00", "--end", "2026-01-12T11:00"])
        .args(["--now", MORNING, "--store", "-", "--exclude", "4"])
        .write_stdin(STORE)
        .assert()
        .success();
}

#[test]
fn check_reads_input_in_operator_zone() {
    // 07:00 in Los Angeles is 10:00 in New York
    apptcheck()
        .args(["check", "--start", "2026-01-12T07:00", "--end", "2026-01-12T08:00"])
        .args(["--now", MORNING, "--operator-tz", "America/Los_Angeles"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2026-01-12T15:00:00+00:00"));

    // 04:30 in Los Angeles is 07:30 in New York, before opening
    apptcheck()
        .args(["check", "--start", "2026-01-12T04:30", "--end", "2026-01-12T05:30"])
        .args(["--now", "2026-01-12T10:00:00Z", "--operator-tz", "America/Los_Angeles"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("outside_business_hours"));
}

#[test]
fn operator_zone_taken_from_tz_variable() {
    apptcheck()
        .env("TZ", ":America/Los_Angeles")
        .args(["check", "--start", "2026-01-12T07:00", "--end", "2026-01-12T08:00"])
        .args(["--now", MORNING])
        .assert()
        .success()
        .stdout(predicate::str::contains("2026-01-12T15:00:00+00:00"));
}

#[test]
fn unknown_zone_flag_fails() {
    apptcheck()
        .args(["slots", "--date", "2026-01-12", "--operator-tz", "Mars/Olympus"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid timezone"));
}

#[test]
fn malformed_start_fails() {
    apptcheck()
        .args(["check", "--start", "tomorrow", "--end", "2026-01-12T11:00"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid --start"));
}

#[test]
fn malformed_store_fails() {
    apptcheck()
        .args(["upcoming", "--store", "-", "--now", MORNING])
        .write_stdin("{\"not\": \"a list\"}")
        .assert()
        .failure()
        .stderr(predicate::str::contains("store is not a JSON array"));
}

#[test]
fn slots_cover_business_day() {
    let output = apptcheck()
        .args(["slots", "--date", "2026-01-12"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let slots = stdout_json(&output);
    let slots = slots.as_array().unwrap();
    assert_eq!(slots.len(), 56);
    assert_eq!(slots[0], "2026-01-12 08:00");
    assert_eq!(slots[55], "2026-01-12 21:45");
}

#[test]
fn end_slots_run_to_closing() {
    let output = apptcheck()
        .args(["slots", "--date", "2026-01-12", "--ends"])
        .output()
        .unwrap();

    let slots = stdout_json(&output);
    let slots = slots.as_array().unwrap();
    assert_eq!(slots[0], "2026-01-12 08:15");
    assert_eq!(slots.last().unwrap(), "2026-01-12 22:00");
}

#[test]
fn slots_shown_in_operator_zone() {
    apptcheck()
        .args(["slots", "--date", "2026-01-12", "--operator-tz", "Asia/Tokyo"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"2026-01-12 22:00\""))
        .stdout(predicate::str::contains("\"2026-01-13 11:45\""));
}

#[test]
fn upcoming_lists_appointments_near_now() {
    // 10:20 New York; Kickoff starts at 10:30
    let output = apptcheck()
        .args(["upcoming", "--store", "-", "--now", "2026-01-12T15:20:00Z"])
        .write_stdin(STORE)
        .output()
        .unwrap();

    assert!(output.status.success());
    let found = stdout_json(&output);
    let found = found.as_array().unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0]["id"], 4);
    assert_eq!(found[0]["start"], "2026-01-12 10:30");
}

#[test]
fn upcoming_with_nothing_close_is_empty() {
    apptcheck()
        .args(["upcoming", "--store", "-", "--now", MORNING])
        .write_stdin(STORE)
        .assert()
        .success()
        .stdout(predicate::str::contains("[]"));
}

#[test]
fn oversized_config_value_fails_cleanly() {
    let dir = std::env::temp_dir().join(format!("apptcheck-oversized-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("engine.json");
    std::fs::write(&path, r#"{"slot_minutes": 9223372036854775807}"#).unwrap();

    apptcheck()
        .arg("--config")
        .arg(&path)
        .args(["slots", "--date", "2026-01-12"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("slot_minutes"));

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn config_file_changes_business_hours() {
    let dir = std::env::temp_dir().join(format!("apptcheck-config-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("engine.json");
    std::fs::write(&path, r#"{"open": "09:00:00", "close": "17:00:00"}"#).unwrap();

    apptcheck()
        .arg("--config")
        .arg(&path)
        .args(["check", "--start", "2026-01-12T16:30", "--end", "2026-01-12T17:30"])
        .args(["--now", MORNING])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("outside_business_hours"));

    std::fs::remove_dir_all(&dir).unwrap();
}
