//! Common utilities for CLI E2E tests.
//!
//! Every [`Cli`] owns a temporary data directory, so tests never touch the
//! user's journal and can run in parallel.

#![allow(dead_code)]

use std::io::Write;
use std::process::{Command, Stdio};

use tempfile::TempDir;

pub struct Cli {
    data_dir: TempDir,
}

impl Cli {
    pub fn new() -> Self {
        Self {
            data_dir: TempDir::new().expect("create temp data dir"),
        }
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_bujo"));
        cmd.env("BUJO_DATA_DIR", self.data_dir.path())
            .env_remove("BUJO_ENV")
            .env_remove("BUJO_LOG");
        cmd
    }

    /// Invoke a CLI command and return (stdout, stderr, exit code).
    pub fn run(&self, args: &[&str]) -> (String, String, i32) {
        let output = self
            .command()
            .args(args)
            .output()
            .expect("Failed to execute CLI command");
        (
            String::from_utf8_lossy(&output.stdout).to_string(),
            String::from_utf8_lossy(&output.stderr).to_string(),
            output.status.code().unwrap_or(-1),
        )
    }

    /// Invoke a CLI command with `input` on stdin and expect success.
    pub fn run_with_stdin(&self, args: &[&str], input: &str) -> String {
        let mut child = self
            .command()
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .expect("Failed to spawn CLI");
        child
            .stdin
            .take()
            .expect("stdin is piped")
            .write_all(input.as_bytes())
            .expect("write stdin");
        let output = child.wait_with_output().expect("wait for CLI");
        assert!(
            output.status.success(),
            "CLI command failed: {:?}\n{}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8_lossy(&output.stdout).to_string()
    }

    /// Invoke a CLI command and expect success.
    pub fn success(&self, args: &[&str]) -> String {
        let (stdout, stderr, code) = self.run(args);
        assert_eq!(code, 0, "CLI command failed: {:?}\n{}", args, stderr);
        stdout
    }

    /// Invoke a CLI command and expect failure; returns stderr.
    pub fn failure(&self, args: &[&str]) -> String {
        let (_, stderr, code) = self.run(args);
        assert_ne!(code, 0, "CLI command unexpectedly succeeded: {:?}", args);
        stderr
    }

    /// Invoke a CLI command and parse its JSON output.
    pub fn json(&self, args: &[&str]) -> serde_json::Value {
        let stdout = self.success(args);
        serde_json::from_str(&stdout)
            .unwrap_or_else(|e| panic!("Failed to parse JSON output ({e}): {stdout}"))
    }
}

/// Check if string contains substring
pub fn assert_contains(haystack: &str, needle: &str) {
    assert!(
        haystack.contains(needle),
        "Expected '{}' to contain '{}'",
        haystack,
        needle
    );
}

pub fn id_of(value: &serde_json::Value) -> String {
    value["entity_id"]
        .as_str()
        .unwrap_or_else(|| panic!("no entity_id in {value}"))
        .to_string()
}
