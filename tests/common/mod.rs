#![allow(dead_code)]

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

use tempfile::TempDir;

pub struct CmdResult {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
    pub log_path: PathBuf,
}

impl CmdResult {
    /// Parse stdout as a single JSON line.
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(self.stdout.trim()).unwrap_or_else(|e| {
            panic!(
                "stdout is not JSON ({e}); log: {}",
                self.log_path.display()
            )
        })
    }
}

/// Isolated HOME with its own config and activity log.
pub struct TestEnv {
    pub dir: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create test home"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn activity_log(&self) -> PathBuf {
        self.path().join("activity.jsonl")
    }

    /// Write a fixture file and return its path as a CLI argument.
    pub fn write(&self, name: &str, contents: &str) -> String {
        let path = self.path().join(name);
        fs::write(&path, contents).expect("write fixture");
        path.to_string_lossy().into_owned()
    }

    pub fn activity_entries(&self) -> Vec<serde_json::Value> {
        fs::read_to_string(self.activity_log())
            .unwrap_or_default()
            .lines()
            .map(|line| serde_json::from_str(line).expect("activity line is JSON"))
            .collect()
    }
}

fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

fn resolve_bin_path() -> PathBuf {
    if let Some(path) = option_env!("CARGO_BIN_EXE_ctxw") {
        return PathBuf::from(path);
    }

    let exe_name = if cfg!(windows) { "ctxw.exe" } else { "ctxw" };
    let fallback = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(PathBuf::from))
        .and_then(|deps| deps.parent().map(PathBuf::from))
        .map(|debug_dir| debug_dir.join(exe_name));

    match fallback {
        Some(path) if path.exists() => path,
        _ => panic!("unable to resolve ctxw binary path for integration test"),
    }
}

pub fn run_cli_case(env: &TestEnv, case_name: &str, args: &[&str]) -> CmdResult {
    run_cli_case_with_stdin(env, case_name, args, None)
}

pub fn run_cli_case_with_stdin(
    env: &TestEnv,
    case_name: &str,
    args: &[&str],
    stdin: Option<&str>,
) -> CmdResult {
    let log_path = env.path().join(format!("{}.log", sanitize(case_name)));
    let bin_path = resolve_bin_path();

    let mut child = Command::new(&bin_path)
        .args(args)
        .env("HOME", env.path())
        .env("CTXW_LOG_PATH", env.activity_log())
        .env_remove("CTXW_OUTPUT_FORMAT")
        .env("RUST_BACKTRACE", "1")
        .stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("execute ctxw command");

    if let Some(input) = stdin {
        let mut pipe = child.stdin.take().expect("stdin pipe");
        pipe.write_all(input.as_bytes()).expect("write stdin");
    }
    let output = child.wait_with_output().expect("wait for ctxw");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    let mut log_content = String::new();
    log_content.push_str(&format!("case={case_name}\n"));
    log_content.push_str(&format!("bin={}\n", bin_path.display()));
    log_content.push_str(&format!("args={args:?}\n"));
    log_content.push_str(&format!("status={}\n", output.status));
    log_content.push_str("----- stdout -----\n");
    log_content.push_str(&stdout);
    log_content.push('\n');
    log_content.push_str("----- stderr -----\n");
    log_content.push_str(&stderr);
    log_content.push('\n');
    fs::write(&log_path, log_content).expect("write test log");

    CmdResult {
        status: output.status,
        stdout,
        stderr,
        log_path,
    }
}
