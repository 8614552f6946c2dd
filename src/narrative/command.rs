use std::fmt::Write as _;
use std::io::{Read, Write as _};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::debug;

use super::contract::parse_response;
use super::prompt::build_prompt;
use super::{NarrativeError, NarrativeGenerator, NarrativeRequest};

/// Environment variable telling the agent which section is requested.
pub const KIND_VAR: &str = "TSR_NARRATIVE_KIND";

/// Time an agent gets per section before it is killed.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Narrator backed by an external program. The prompt is written to its
/// stdin and a JSON document, optionally fenced, is read from its stdout.
#[derive(Debug, Clone)]
pub struct CommandNarrator {
    name: String,
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandNarrator {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        let program = program.into();
        Self {
            name: program.clone(),
            program,
            args,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Split a shell-like command line on whitespace. Returns `None` when empty.
    pub fn from_command_line(command_line: &str) -> Option<Self> {
        let mut parts = command_line.split_whitespace().map(String::from);
        let program = parts.next()?;
        Some(Self::new(program, parts.collect()))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Poll until the child exits or the deadline passes. A child past its
    /// deadline is killed and reported as unavailable.
    fn wait_with_deadline(&self, child: &mut Child) -> Result<ExitStatus, NarrativeError> {
        let started = Instant::now();
        loop {
            match child.try_wait() {
                Ok(Some(status)) => return Ok(status),
                Ok(None) if started.elapsed() >= self.timeout => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(NarrativeError::unavailable(
                        &self.name,
                        format!("{} timed out after {:?}", self.program, self.timeout),
                    ));
                }
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(e) => {
                    return Err(NarrativeError::unavailable(
                        &self.name,
                        format!("Failed to wait for {}: {e}", self.program),
                    ))
                }
            }
        }
    }
}

/// Read a pipe to the end on its own thread.
fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        buf
    })
}

impl NarrativeGenerator for CommandNarrator {
    fn name(&self) -> &str {
        &self.name
    }

    fn generate(&self, request: &NarrativeRequest<'_>) -> Result<serde_json::Value, NarrativeError> {
        let prompt = build_prompt(request)?;
        debug!("Invoking narrative agent '{}' for {}", self.program, request.kind());

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .env(KIND_VAR, request.kind().as_str())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                NarrativeError::unavailable(&self.name, format!("Failed to spawn {}: {e}", self.program))
            })?;

        // Stdin is fed and both outputs drained concurrently so a chatty
        // agent cannot block on a full pipe.
        if let Some(mut stdin) = child.stdin.take() {
            let program = self.program.clone();
            thread::spawn(move || {
                // A closed pipe surfaces as a failed exit status
                if let Err(e) = stdin.write_all(prompt.as_bytes()) {
                    debug!("Writing prompt to '{}' failed: {}", program, e);
                }
            });
        }
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = self.wait_with_deadline(&mut child)?;
        let collect = |handle: JoinHandle<Vec<u8>>| handle.join().unwrap_or_default();
        let stdout = collect(stdout);
        let stderr = collect(stderr);

        if !status.success() {
            let mut msg = format!("Command failed: {}", self.program);
            if let Some(code) = status.code() {
                let _ = write!(msg, " (exit {code})");
            }
            let stderr = String::from_utf8_lossy(&stderr);
            if !stderr.trim().is_empty() {
                let _ = write!(msg, "\nstderr:\n{}", stderr.trim());
            }
            return Err(NarrativeError::unavailable(&self.name, msg));
        }

        let stdout = String::from_utf8_lossy(&stdout);
        parse_response(&self.name, &stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CanonicalRecord, CanonicalTable, TestResult};

    fn request_table() -> CanonicalTable {
        CanonicalTable::new(vec![CanonicalRecord::new("Login", "TC1", TestResult::Pass)])
    }

    #[test]
    fn test_from_command_line() {
        let narrator = CommandNarrator::from_command_line("  agent --model fast ").unwrap();
        assert_eq!(narrator.name(), "agent");
        assert_eq!(narrator.args, vec!["--model", "fast"]);
        assert!(CommandNarrator::from_command_line("   ").is_none());
    }

    #[test]
    fn test_missing_program_is_unavailable() {
        let table = request_table();
        let narrator = CommandNarrator::new("tsrgen-definitely-not-installed", Vec::new());
        let err = narrator
            .generate(&NarrativeRequest::Ingestion {
                file_type: "csv",
                table: &table,
            })
            .unwrap_err();
        assert!(matches!(err, NarrativeError::AgentUnavailable { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_fenced_stdout_is_parsed() {
        let table = request_table();
        let script = "cat >/dev/null; printf '```json\\n{\"ok\": true}\\n```\\n'";
        let narrator = CommandNarrator::new("sh", vec!["-c".into(), script.into()]);
        let value = narrator
            .generate(&NarrativeRequest::Ingestion {
                file_type: "csv",
                table: &table,
            })
            .unwrap();
        assert_eq!(value["ok"], true);
    }

    #[cfg(unix)]
    #[test]
    fn test_non_zero_exit_is_unavailable() {
        let table = request_table();
        let narrator = CommandNarrator::new("sh", vec!["-c".into(), "cat >/dev/null; exit 3".into()]);
        let err = narrator
            .generate(&NarrativeRequest::Ingestion {
                file_type: "csv",
                table: &table,
            })
            .unwrap_err();
        assert!(err.to_string().contains("exit 3"));
    }

    #[cfg(unix)]
    #[test]
    fn test_prose_stdout_is_invalid_response() {
        let table = request_table();
        let narrator = CommandNarrator::new("sh", vec!["-c".into(), "cat >/dev/null; echo hello".into()]);
        let err = narrator
            .generate(&NarrativeRequest::Ingestion {
                file_type: "csv",
                table: &table,
            })
            .unwrap_err();
        assert!(matches!(err, NarrativeError::InvalidResponse { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_hung_agent_times_out() {
        let table = request_table();
        let narrator = CommandNarrator::new("sh", vec!["-c".into(), "exec sleep 30".into()])
            .with_timeout(Duration::from_millis(200));
        let started = Instant::now();
        let err = narrator
            .generate(&NarrativeRequest::Ingestion {
                file_type: "csv",
                table: &table,
            })
            .unwrap_err();
        assert!(matches!(err, NarrativeError::AgentUnavailable { .. }));
        assert!(err.to_string().contains("timed out"));
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[cfg(unix)]
    #[test]
    fn test_agent_flooding_stderr_before_reading_large_prompt() {
        let records: Vec<CanonicalRecord> = (0..5000)
            .map(|i| CanonicalRecord {
                bug_id: format!("BUG-{i}"),
                ..CanonicalRecord::new("Login", &format!("TC{i}"), TestResult::Fail)
            })
            .collect();
        let metrics = crate::metrics::compute(&CanonicalTable::new(records));
        let prompt = build_prompt(&NarrativeRequest::Analysis { metrics: &metrics }).unwrap();
        assert!(prompt.len() > 256 * 1024);

        let script = "head -c 200000 /dev/zero >&2; cat >/dev/null; echo '{\"ok\": true}'";
        let narrator = CommandNarrator::new("sh", vec!["-c".into(), script.into()])
            .with_timeout(Duration::from_secs(60));
        let value = narrator
            .generate(&NarrativeRequest::Analysis { metrics: &metrics })
            .unwrap();
        assert_eq!(value["ok"], true);
    }
}
