//! [`Gate`]: allow-list check in front of process spawning.
//!
//! Checks run in order and the first failure wins:
//!
//! 1. the executable exists,
//! 2. its path is absolute,
//! 3. its path is already canonical (no `..`, no symlinks),
//! 4. the exact path is in the allow-list,
//! 5. the working directory, if given, exists.
//!
//! The child starts with an empty environment. Only the executable and the
//! working directory are logged; parameters may carry user data.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use common::protocol::ExecResponse;
use tracing::{info, warn};

use crate::command::CommandLine;
use crate::config::ExecutorConfig;
use crate::error::ExecError;

/// Captured result of a finished child process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecOutput {
    /// Exit code, or `None` if the child was killed by a signal.
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ExecOutput {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }
}

impl From<ExecOutput> for ExecResponse {
    fn from(out: ExecOutput) -> Self {
        ExecResponse {
            status: out.status,
            stdout: out.stdout,
            stderr: out.stderr,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Gate {
    allowed: Vec<PathBuf>,
}

impl Gate {
    /// Build a gate from validated configuration.
    pub fn new(cfg: &ExecutorConfig) -> Result<Self, ExecError> {
        cfg.validate()?;
        Ok(Self {
            allowed: cfg.allowed_executables.iter().map(PathBuf::from).collect(),
        })
    }

    pub fn is_allowed(&self, executable: &Path) -> bool {
        self.allowed.iter().any(|p| p == executable)
    }

    /// Run `cmd` to completion and capture its output.
    ///
    /// A non-zero exit status is not an error; inspect
    /// [`ExecOutput::status`].
    ///
    /// # Errors
    ///
    /// Returns a policy [`ExecError`] if any check fails, or
    /// [`ExecError::Io`] if the process cannot be spawned.
    pub fn execute(&self, cmd: &CommandLine) -> Result<ExecOutput, ExecError> {
        let exe = cmd.executable();
        self.check_executable(exe)?;

        let mut command = Command::new(exe);
        command
            .args(cmd.args())
            .env_clear()
            .stdin(Stdio::null());

        if let Some(dir) = cmd.workdir() {
            if !dir.is_dir() {
                return Err(ExecError::MissingWorkdir(dir.to_path_buf()));
            }
            command.current_dir(dir);
        }

        info!(
            executable = %exe.display(),
            workdir = ?cmd.workdir().map(Path::display),
            arg_count = cmd.args().len(),
            "initiating executable"
        );
        let output = command.output()?;

        let result = ExecOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        if !result.stderr.is_empty() {
            warn!(
                executable = %exe.display(),
                stderr_len = result.stderr.len(),
                "executable wrote to stderr"
            );
        }
        info!(executable = %exe.display(), status = ?result.status, "executable complete");
        Ok(result)
    }

    fn check_executable(&self, exe: &Path) -> Result<(), ExecError> {
        if !exe.exists() {
            return Err(ExecError::NotFound(exe.to_path_buf()));
        }
        if !exe.is_absolute() {
            return Err(ExecError::NotAbsolute(exe.to_path_buf()));
        }
        if fs::canonicalize(exe)? != exe {
            return Err(ExecError::NotCanonical(exe.to_path_buf()));
        }
        if !self.is_allowed(exe) {
            warn!(executable = %exe.display(), "refused executable not in allow-list");
            return Err(ExecError::NotAllowed(exe.to_path_buf()));
        }
        Ok(())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::encoder::OsCodec;

    /// Canonical path of a coreutils binary, skipping multi-call layouts.
    fn tool(name: &str) -> Option<PathBuf> {
        ["/bin", "/usr/bin"]
            .iter()
            .filter_map(|dir| fs::canonicalize(Path::new(dir).join(name)).ok())
            .find(|p| p.file_name().and_then(|f| f.to_str()) == Some(name))
    }

    fn gate_for(path: &Path) -> Gate {
        Gate::new(&ExecutorConfig::new([path.to_string_lossy().into_owned()])).unwrap()
    }

    #[test]
    fn runs_allowed_executable_with_escaped_args() {
        let Some(echo) = tool("echo") else { return };
        let gate = gate_for(&echo);
        let cmd = CommandLine::builder(&echo)
            .arg("hello")
            .arg("a b")
            .workdir(std::env::temp_dir())
            .build(OsCodec::Unix);

        let out = gate.execute(&cmd).unwrap();
        assert!(out.success());
        assert_eq!(out.stdout, "hello a\\ b\n");
    }

    #[test]
    fn non_zero_exit_is_reported_not_raised() {
        let Some(false_bin) = tool("false") else { return };
        let out = gate_for(&false_bin)
            .execute(&CommandLine::builder(&false_bin).build(OsCodec::Unix))
            .unwrap();
        assert_eq!(out.status, Some(1));
        assert!(!out.success());
    }

    #[test]
    fn environment_is_cleared() {
        let Some(env) = tool("env") else { return };
        std::env::set_var("EXECUTOR_GATE_TEST_VAR", "leak");
        let out = gate_for(&env)
            .execute(&CommandLine::builder(&env).build(OsCodec::Unix))
            .unwrap();
        assert!(!out.stdout.contains("EXECUTOR_GATE_TEST_VAR"));
    }

    #[test]
    fn rejects_missing_executable() {
        let gate = Gate::new(&ExecutorConfig::new(["/no/such/binary"])).unwrap();
        let cmd = CommandLine::builder("/no/such/binary").build(OsCodec::Unix);
        assert!(matches!(gate.execute(&cmd), Err(ExecError::NotFound(_))));
    }

    #[test]
    fn rejects_relative_path() {
        let Some(echo) = tool("echo") else { return };
        // Climb to `/` from any working directory, then descend to the binary.
        let relative = PathBuf::from("../".repeat(64)).join(echo.strip_prefix("/").unwrap());
        let err = gate_for(&echo)
            .execute(&CommandLine::builder(&relative).build(OsCodec::Unix))
            .unwrap_err();
        assert!(matches!(err, ExecError::NotAbsolute(_)));
    }

    #[test]
    fn rejects_non_canonical_path() {
        let Some(echo) = tool("echo") else { return };
        let Some(dir) = echo.parent() else { return };
        let Some(dir_name) = dir.file_name() else { return };
        let dotted = dir.join("..").join(dir_name).join("echo");
        let err = gate_for(&echo)
            .execute(&CommandLine::builder(&dotted).build(OsCodec::Unix))
            .unwrap_err();
        assert!(matches!(err, ExecError::NotCanonical(_)));
    }

    #[test]
    fn rejects_executable_outside_allow_list() {
        let Some(echo) = tool("echo") else { return };
        let gate = Gate::new(&ExecutorConfig::default()).unwrap();
        let err = gate
            .execute(&CommandLine::builder(&echo).build(OsCodec::Unix))
            .unwrap_err();
        assert!(matches!(err, ExecError::NotAllowed(_)));
        assert_eq!(err.kind(), common::ErrorKind::Policy);
    }

    #[test]
    fn rejects_missing_workdir() {
        let Some(echo) = tool("echo") else { return };
        let cmd = CommandLine::builder(&echo)
            .workdir("/no/such/workdir")
            .build(OsCodec::Unix);
        assert!(matches!(
            gate_for(&echo).execute(&cmd),
            Err(ExecError::MissingWorkdir(_))
        ));
    }

    #[test]
    fn output_converts_to_response() {
        let resp: ExecResponse = ExecOutput {
            status: Some(0),
            stdout: "ok".into(),
            stderr: String::new(),
        }
        .into();
        assert_eq!(resp.status, Some(0));
        assert_eq!(resp.stdout, "ok");
    }
}
