use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

struct Workspace {
    dir: TempDir,
    config: PathBuf,
}

impl Workspace {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let config = dir.path().join("config.toml");
        std::fs::write(
            &config,
            format!(
                "[storage]\ndatabase_path = {:?}\ndata_file = {:?}\n\n[report]\noutput_dir = {:?}\n",
                dir.path().join("visitlog.db"),
                dir.path().join("entries.json"),
                dir.path().join("reports"),
            ),
        )
        .unwrap();
        Self { dir, config }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_visitlog"))
            .current_dir(self.path())
            .env_remove("RUST_LOG")
            .arg("--config")
            .arg(&self.config)
            .args(args)
            .output()
            .unwrap()
    }

    fn add(&self, name: &str, identifier: &str, extra: &[&str]) -> Output {
        let mut args = vec![
            "add",
            "--name",
            name,
            "--identifier",
            identifier,
            "--role",
            "Engineer",
            "--organization",
            "ACME",
        ];
        args.extend_from_slice(extra);
        self.run(&args)
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn listed(ws: &Workspace, args: &[&str]) -> Vec<serde_json::Value> {
    let mut full = vec!["list", "--format", "json"];
    full.extend_from_slice(args);
    let output = ws.run(&full);
    assert!(output.status.success(), "{}", stderr(&output));
    serde_json::from_str(&stdout(&output)).unwrap()
}

#[test]
fn test_add_and_list() {
    let ws = Workspace::new();

    let output = ws.add("Ana Souza", "111", &[]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).contains("Recorded entry"));

    ws.add("Bruno Lima", "222", &[]);

    let entries = listed(&ws, &[]);
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["nome"], "Bruno Lima");
    assert_eq!(entries[1]["cpf"], "111");
    assert!(ws.path().join("entries.json").exists());
}

#[test]
fn test_list_table() {
    let ws = Workspace::new();
    ws.add("Ana Souza", "111", &[]);

    let output = ws.run(&["list"]);
    assert!(output.status.success(), "{}", stderr(&output));
    let text = stdout(&output);
    let mut lines = text.lines();
    let header = lines.next().unwrap();
    assert!(header.starts_with("Id"));
    assert!(header.contains("Name"));
    assert!(header.contains("Organization"));
    let row = lines.nth(1).unwrap();
    assert_eq!(row.find("Ana Souza"), header.find("Name"));
    assert!(row.contains("ACME"));
    assert!(text.contains("1 of 1 entries"));
}

#[test]
fn test_quiet_keeps_command_output() {
    let ws = Workspace::new();
    ws.add("Ana Souza", "111", &[]);

    let output = ws.run(&["-q", "stats"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).contains("Total entries:  1"));
    assert!(stderr(&output).is_empty(), "{}", stderr(&output));
}

#[test]
fn test_search_term() {
    let ws = Workspace::new();
    ws.add("Ana Souza", "111", &[]);
    ws.add("Bruno Lima", "222", &[]);

    let entries = listed(&ws, &["bru"]);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["nome"], "Bruno Lima");
}

#[test]
fn test_missing_fields_are_rejected() {
    let ws = Workspace::new();

    let output = ws.run(&["add", "--name", "Ana", "--role", "Engineer"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("missing required fields: identifier, organization"));
    assert!(listed(&ws, &[]).is_empty());
}

#[test]
fn test_invalid_date_bound_is_rejected() {
    let ws = Workspace::new();
    ws.add("Ana Souza", "111", &[]);

    let output = ws.run(&["list", "--from", "31/02/2024"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("invalid date '31/02/2024'"));
}

#[test]
fn test_show_and_delete() {
    let ws = Workspace::new();
    ws.add("Ana Souza", "111", &[]);
    let id = listed(&ws, &[])[0]["id"].as_str().unwrap().to_string();

    let output = ws.run(&["show", &id]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("Ana Souza"));
    assert!(stdout(&output).contains("Photo:         none"));

    let output = ws.run(&["delete", &id]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(listed(&ws, &[]).is_empty());

    let output = ws.run(&["delete", &id]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("no entry with id"));
}

#[test]
fn test_autofill_from_previous_entry() {
    let ws = Workspace::new();
    ws.add("Ana Souza", "111", &["--phone", "(81) 99999-0000"]);

    let output = ws.run(&["lookup", "111"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("Ana Souza"));

    let output = ws.run(&["add", "--identifier", "111", "--autofill"]);
    assert!(output.status.success(), "{}", stderr(&output));

    let entries = listed(&ws, &[]);
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["nome"], "Ana Souza");
    assert_eq!(entries[0]["telefone"], "(81) 99999-0000");
}

#[test]
fn test_photo_is_embedded() {
    let ws = Workspace::new();
    let photo = ws.path().join("face.png");
    std::fs::write(&photo, b"hi").unwrap();

    let output = ws.add("Ana Souza", "111", &["--photo", photo.to_str().unwrap()]);
    assert!(output.status.success(), "{}", stderr(&output));

    let entries = listed(&ws, &[]);
    assert_eq!(entries[0]["foto"], "data:image/png;base64,aGk=");
}

#[test]
fn test_export_and_import() {
    let ws = Workspace::new();
    ws.add("Ana Souza", "111", &[]);
    ws.add("Bruno Lima", "222", &[]);

    let output = ws.run(&["export"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).contains("Exported 2 entries"));
    let backup = ws.path().join("backup-entries.json");
    assert!(backup.exists());

    let id = listed(&ws, &[])[0]["id"].as_str().unwrap().to_string();
    ws.run(&["delete", &id]);
    assert_eq!(listed(&ws, &[]).len(), 1);

    let output = ws.run(&["import", backup.to_str().unwrap()]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).contains("Imported 2 entries"));
    assert_eq!(listed(&ws, &[]).len(), 2);
}

#[test]
fn test_failed_import_keeps_entries() {
    let ws = Workspace::new();
    ws.add("Ana Souza", "111", &[]);
    let bad = ws.path().join("bad.json");
    std::fs::write(&bad, "not json").unwrap();

    let output = ws.run(&["import", bad.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("failed to import entries"));
    assert_eq!(listed(&ws, &[]).len(), 1);
}

#[test]
fn test_report_is_written() {
    let ws = Workspace::new();
    ws.add("Ana Souza", "111", &[]);

    let output = ws.run(&["report"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).contains("1 entries, 1 pages"));

    let reports: Vec<_> = std::fs::read_dir(ws.path().join("reports"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(reports.len(), 1);
    assert!(reports[0].starts_with("entry-report-"));
    assert!(reports[0].ends_with(".txt"));
}

#[test]
fn test_local_backend() {
    let ws = Workspace::new();

    let output = ws.add("Ana Souza", "111", &["--backend", "local"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(ws.path().join("visitlog.db").exists());
    assert!(!ws.path().join("entries.json").exists());

    assert_eq!(listed(&ws, &["--backend", "local"]).len(), 1);
    assert!(listed(&ws, &[]).is_empty());
}

#[test]
fn test_corrupt_data_file_starts_empty() {
    let ws = Workspace::new();
    std::fs::write(ws.path().join("entries.json"), "{ broken").unwrap();

    let output = ws.run(&["stats"]);
    assert!(output.status.success());
    assert!(stderr(&output).contains("Notice:"));
    assert!(stdout(&output).contains("Total entries:  0"));
}

#[test]
fn test_config_validate() {
    let ws = Workspace::new();
    let output = ws.run(&["config", "validate"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).contains("Configuration is valid."));

    let bad = ws.path().join("bad.toml");
    std::fs::write(&bad, "[report]\nrows_per_page = 0\n").unwrap();
    let output = ws.run(&["config", "validate", "--file", bad.to_str().unwrap()]);
    assert!(!output.status.success());
}
