//! Subprocess-backed compiler.
//!
//! Speaks a JSON-line protocol over the child's stdio: one request object
//! per line on stdin, one response header line on stdout followed by the
//! raw artifact bytes. The format is private to this module.

use std::io::{BufRead, BufReader, Read, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use serde::{Deserialize, Serialize};

use super::{CompilerConnector, RemoteCompiler};
use crate::errors::{LoadError, Result};
use crate::name::ResourceName;

#[derive(Serialize)]
struct CompileRequest<'a> {
    kind: &'a str,
    name: &'a str,
}

#[derive(Deserialize)]
struct CompileResponse {
    ok: bool,
    #[serde(default)]
    len: usize,
    #[serde(default)]
    error: Option<String>,
}

/// Spawns compiler subprocesses from a configured command line.
pub struct ProcessCompilerConnector {
    command: String,
    args: Vec<String>,
}

impl ProcessCompilerConnector {
    #[must_use]
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
        }
    }
}

impl CompilerConnector for ProcessCompilerConnector {
    fn connect(&self) -> Option<Box<dyn RemoteCompiler>> {
        let mut child = match Command::new(&self.command)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn()
        {
            Ok(child) => child,
            Err(err) => {
                log::error!("failed to spawn compiler '{}': {err}", self.command);
                return None;
            }
        };
        let stdin = child.stdin.take()?;
        let stdout = child.stdout.take()?;
        log::info!("compiler process started (pid {})", child.id());
        Some(Box::new(ProcessCompiler {
            child,
            stdin,
            stdout: BufReader::new(stdout),
        }))
    }
}

/// One live compiler child process.
pub struct ProcessCompiler {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

impl RemoteCompiler for ProcessCompiler {
    fn compile(&mut self, kind: &'static str, name: &ResourceName) -> Result<Vec<u8>> {
        let request = CompileRequest {
            kind,
            name: name.as_str(),
        };
        let mut line = serde_json::to_string(&request).map_err(|err| LoadError::CompileFailed {
            kind,
            name: name.clone(),
            reason: err.to_string(),
        })?;
        line.push('\n');
        self.stdin.write_all(line.as_bytes())?;
        self.stdin.flush()?;

        let mut header = String::new();
        self.stdout.read_line(&mut header)?;
        let response: CompileResponse =
            serde_json::from_str(header.trim()).map_err(|err| LoadError::CompileFailed {
                kind,
                name: name.clone(),
                reason: format!("malformed compiler response: {err}"),
            })?;
        if !response.ok {
            return Err(LoadError::CompileFailed {
                kind,
                name: name.clone(),
                reason: response
                    .error
                    .unwrap_or_else(|| "compiler reported failure".to_string()),
            });
        }
        let mut blob = vec![0u8; response.len];
        self.stdout.read_exact(&mut blob)?;
        Ok(blob)
    }
}

impl Drop for ProcessCompiler {
    fn drop(&mut self) {
        // The child has no graceful-shutdown contract; kill and reap.
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
