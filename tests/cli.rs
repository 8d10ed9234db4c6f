use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const PASSWORD: &str = "correct horse battery staple";
const CSV: &str = "id,name,email\n1,Alice,alice@example.com\n2,Bob,bob@example.com\n";

struct Env {
    config: TempDir,
    data: TempDir,
}

impl Env {
    fn new() -> Self {
        let config = TempDir::new().unwrap();
        // Keep key derivation fast
        fs::write(
            config.path().join("config.json"),
            r#"{"kdf": {"iterations": 1000}}"#,
        )
        .unwrap();

        let data = TempDir::new().unwrap();
        fs::write(data.path().join("people.csv"), CSV).unwrap();

        Self { config, data }
    }

    fn cmd(&self, password: &str) -> Command {
        let mut cmd = Command::cargo_bin("colcrypt").unwrap();
        cmd.env("COLCRYPT_CONFIG_DIR", self.config.path())
            .env("COLCRYPT_PASSWORD", password)
            .env_remove("COLCRYPT_LOCATION")
            .env_remove("COLCRYPT_LOG");
        cmd
    }

    fn column_cmd(&self, op: &str, password: &str, columns: &str) -> Command {
        let mut cmd = self.cmd(password);
        cmd.arg(op)
            .arg("--location")
            .arg(self.data.path())
            .args(["--table", "people", "--column", columns]);
        cmd
    }

    fn table(&self) -> String {
        fs::read_to_string(self.data.path().join("people.csv")).unwrap()
    }

    fn audit_log(&self) -> String {
        let path = self.config.path().join("audit.log");
        if Path::new(&path).exists() {
            fs::read_to_string(path).unwrap()
        } else {
            String::new()
        }
    }
}

#[test]
fn encrypt_hides_plaintext() {
    let env = Env::new();

    env.column_cmd("encrypt", PASSWORD, "name,email")
        .assert()
        .success()
        .stdout(predicate::str::contains("encrypt: 2 rows"));

    let table = env.table();
    assert!(table.starts_with("id,name,email"));
    assert!(!table.contains("Alice"));
    assert!(!table.contains("bob@example.com"));
    assert!(table.contains("gAAAAA"));
    // Untouched column keeps its values
    assert!(table.contains("\n1,"));
}

#[test]
fn decrypt_restores_original() {
    let env = Env::new();

    env.column_cmd("encrypt", PASSWORD, "name,email").assert().success();
    env.column_cmd("decrypt", PASSWORD, "name,email").assert().success();

    assert_eq!(env.table(), CSV);
}

#[test]
fn wrong_password_leaves_tokens_and_fails() {
    let env = Env::new();

    env.column_cmd("encrypt", PASSWORD, "email").assert().success();
    let encrypted = env.table();

    env.column_cmd("decrypt", "not the password", "email")
        .assert()
        .failure()
        .stderr(predicate::str::contains("None of 2 value(s) could be decrypted"));

    assert_eq!(env.table(), encrypted);
    assert!(!encrypted.contains("not the password"));
}

#[test]
fn partial_failure_writes_marker() {
    let env = Env::new();

    env.column_cmd("encrypt", PASSWORD, "email").assert().success();
    env.column_cmd("encrypt", "other password", "name").assert().success();

    env.column_cmd("decrypt", PASSWORD, "email,name")
        .assert()
        .success()
        .stdout(predicate::str::contains("2 value(s) could not be decrypted"));

    let table = env.table();
    assert!(table.contains("alice@example.com"));
    assert!(table.contains("#DECRYPTION FAILED"));
    assert!(!table.contains("Alice"));
    assert!(!table.contains("other password"));
}

#[test]
fn keep_ciphertext_leaves_failed_tokens() {
    let env = Env::new();

    env.column_cmd("encrypt", PASSWORD, "email").assert().success();
    env.column_cmd("encrypt", "other password", "name").assert().success();

    env.column_cmd("decrypt", PASSWORD, "email,name")
        .arg("--keep-ciphertext")
        .assert()
        .success()
        .stdout(predicate::str::contains("left encrypted"));

    let table = env.table();
    assert!(table.contains("alice@example.com"));
    assert!(!table.contains("#DECRYPTION FAILED"));
    assert!(!table.contains("Alice"));

    env.column_cmd("decrypt", "other password", "name").assert().success();
    assert_eq!(env.table(), CSV);
}

#[test]
fn verify_reports_wrong_password() {
    let env = Env::new();

    env.column_cmd("encrypt", PASSWORD, "email").assert().success();
    let encrypted = env.table();

    env.column_cmd("verify", PASSWORD, "email")
        .assert()
        .success()
        .stdout(predicate::str::contains("All values decrypt"));

    env.column_cmd("verify", "wrong", "email")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Verification failed"));

    assert_eq!(env.table(), encrypted);
}

#[test]
fn missing_column_fails_without_writing() {
    let env = Env::new();

    env.column_cmd("encrypt", PASSWORD, "email,phone")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Column not found: phone"));

    assert_eq!(env.table(), CSV);
}

#[test]
fn missing_table_fails() {
    let env = Env::new();

    env.cmd(PASSWORD)
        .arg("encrypt")
        .arg("--location")
        .arg(env.data.path())
        .args(["--table", "nobody", "--column", "email"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Table not found"));
}

#[test]
fn audit_log_records_operations_without_password() {
    let env = Env::new();

    env.column_cmd("encrypt", PASSWORD, "email").assert().success();
    env.column_cmd("decrypt", PASSWORD, "email").assert().success();

    let log = env.audit_log();
    assert_eq!(log.lines().count(), 2);
    assert!(log.contains("\"encrypt\""));
    assert!(log.contains("\"decrypt\""));
    assert!(!log.contains(PASSWORD));

    env.cmd(PASSWORD)
        .arg("history")
        .assert()
        .success()
        .stdout(predicate::str::contains("people"));
}

#[test]
fn show_prints_rows() {
    let env = Env::new();

    env.cmd(PASSWORD)
        .arg("show")
        .arg("--location")
        .arg(env.data.path())
        .args(["--table", "people", "--limit", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Alice"))
        .stdout(predicate::str::contains("Bob").not())
        .stdout(predicate::str::contains("1 more row"));
}

#[test]
fn history_filters_by_table() {
    let env = Env::new();
    fs::write(env.data.path().join("orders.csv"), "id,card\n1,4111\n").unwrap();

    env.column_cmd("encrypt", PASSWORD, "email").assert().success();
    env.cmd(PASSWORD)
        .arg("encrypt")
        .arg("--location")
        .arg(env.data.path())
        .args(["--table", "orders", "--column", "card"])
        .assert()
        .success();

    env.cmd(PASSWORD)
        .args(["history", "--table", "orders"])
        .assert()
        .success()
        .stdout(predicate::str::contains("/orders"))
        .stdout(predicate::str::contains("/people").not());
}

#[test]
fn sqlite_table_round_trip() {
    let env = Env::new();
    let db = env.data.path().join("app.db");
    {
        let conn = rusqlite::Connection::open(&db).unwrap();
        conn.execute_batch(
            "CREATE TABLE users (id INTEGER, email TEXT);
             INSERT INTO users VALUES (1, 'alice@example.com'), (2, NULL);",
        )
        .unwrap();
    }

    let sqlite_cmd = |op: &str| {
        let mut cmd = env.cmd(PASSWORD);
        cmd.arg(op)
            .arg("--location")
            .arg(&db)
            .args(["--table", "users", "--column", "email", "--format", "sqlite"]);
        cmd
    };

    sqlite_cmd("encrypt")
        .assert()
        .success()
        .stdout(predicate::str::contains("1 transformed, 1 null"));

    let stored: String = rusqlite::Connection::open(&db)
        .unwrap()
        .query_row("SELECT email FROM users WHERE id = 1", [], |row| row.get(0))
        .unwrap();
    assert!(stored.starts_with("gAAAAA"));

    sqlite_cmd("decrypt").assert().success();

    let conn = rusqlite::Connection::open(&db).unwrap();
    let email: String = conn
        .query_row("SELECT email FROM users WHERE id = 1", [], |row| row.get(0))
        .unwrap();
    let missing: Option<String> = conn
        .query_row("SELECT email FROM users WHERE id = 2", [], |row| row.get(0))
        .unwrap();
    assert_eq!(email, "alice@example.com");
    assert_eq!(missing, None);
}

#[test]
fn config_init_writes_settings_file() {
    let config = TempDir::new().unwrap();
    let settings = config.path().join("config.json");

    Command::cargo_bin("colcrypt")
        .unwrap()
        .env("COLCRYPT_CONFIG_DIR", config.path())
        .args(["config", "--init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote"));

    let written = fs::read_to_string(&settings).unwrap();
    assert!(written.contains("\"iterations\": 100000"));

    Command::cargo_bin("colcrypt")
        .unwrap()
        .env("COLCRYPT_CONFIG_DIR", config.path())
        .args(["config", "--init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
    assert_eq!(fs::read_to_string(&settings).unwrap(), written);
}

#[test]
fn config_command_shows_settings() {
    let env = Env::new();

    env.cmd(PASSWORD)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("KDF iterations: 1000"))
        .stdout(predicate::str::contains(PASSWORD).not());
}
