//! Provider backed by an external command.
//!
//! The command receives one JSON request on stdin:
//!
//! ```json
//! {"model": "...", "system": "...", "prompt": "...", "max_tokens": 512, "temperature": 0.0}
//! ```
//!
//! and answers on stdout, either as `{"text": "...", "tokens": 123}` or as
//! plain text. Failures are classified for the admission controller:
//! timeouts, exit code 75 (`EX_TEMPFAIL`) and an `HTTP 429` / `HTTP 5xx`
//! marker on stderr are transient, everything else is fatal.

use async_trait::async_trait;
use docquorum_application::ports::provider::{
    Provider, ProviderError, ProviderReply, ProviderRequest,
};
use docquorum_domain::chunking::estimate_tokens;
use docquorum_domain::core::string::truncate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::process::Stdio;
use std::sync::LazyLock;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

/// Exit code a command uses to ask for a retry.
pub const EXIT_TEMPFAIL: i32 = 75;

static RE_TRANSIENT_STATUS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bHTTP[ /]?(?:\d\.\d )?(429|5\d\d)\b").expect("valid status marker regex")
});

/// Maximum stderr bytes carried into an error message
const MAX_STDERR_IN_ERROR: usize = 400;

#[derive(Debug, Serialize)]
struct CommandRequest<'a> {
    model: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    prompt: &'a str,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct CommandReply {
    text: String,
    #[serde(default)]
    tokens: Option<u64>,
}

/// Runs one process per call.
#[derive(Debug, Clone)]
pub struct CommandProvider {
    id: String,
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandProvider {
    pub fn new(id: impl Into<String>, program: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            program: program.into(),
            args: Vec::new(),
            timeout: Duration::from_secs(120),
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // Linux: request kernel to send SIGTERM to child when parent dies.
        #[cfg(target_os = "linux")]
        unsafe {
            cmd.pre_exec(|| {
                libc::prctl(libc::PR_SET_PDEATHSIG, libc::SIGTERM);
                Ok(())
            });
        }

        cmd
    }

    async fn run(&self, input: Vec<u8>) -> Result<std::process::Output, ProviderError> {
        let mut child = self.command().spawn().map_err(|e| {
            let message = format!("failed to spawn {}: {}", self.program, e);
            match e.kind() {
                std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied => {
                    ProviderError::Fatal(message)
                }
                _ => ProviderError::Transient(message),
            }
        })?;

        // The request is written while stdout and stderr drain, so a child
        // that stops reading cannot hold the call past its timeout.
        let stdin = child.stdin.take();
        let id = self.id.as_str();
        let write_request = async move {
            if let Some(mut stdin) = stdin {
                // A command that exits without reading its input is judged by
                // its exit status, not by the broken pipe.
                if let Err(e) = stdin.write_all(&input).await {
                    debug!("{}: could not write request: {}", id, e);
                }
            }
        };
        let exchange = async move {
            let ((), output) = tokio::join!(write_request, child.wait_with_output());
            output
        };

        match tokio::time::timeout(self.timeout, exchange).await {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(e)) => Err(ProviderError::Transient(format!(
                "{} failed while running: {}",
                self.program, e
            ))),
            Err(_) => Err(ProviderError::Transient(format!(
                "{} timed out after {:?}",
                self.program, self.timeout
            ))),
        }
    }
}

#[async_trait]
impl Provider for CommandProvider {
    fn id(&self) -> &str {
        &self.id
    }

    async fn call(&self, request: &ProviderRequest) -> Result<ProviderReply, ProviderError> {
        let input = serde_json::to_vec(&CommandRequest {
            model: &request.model,
            system: request.system_prompt.as_deref(),
            prompt: &request.prompt,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        })
        .map_err(|e| ProviderError::Fatal(format!("could not encode request: {}", e)))?;

        debug!(
            "{}: running {} ({} byte request)",
            self.id,
            self.program,
            input.len()
        );
        let output = self.run(input).await?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() {
            return Err(classify_failure(output.status.code(), &stderr));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_reply(&stdout, &request.prompt)
    }
}

/// Map a failed exit to a provider error.
fn classify_failure(code: Option<i32>, stderr: &str) -> ProviderError {
    let detail = truncate(stderr.trim(), MAX_STDERR_IN_ERROR);
    let code_text = code.map_or_else(|| "signal".to_string(), |c| c.to_string());

    if let Some(status) = RE_TRANSIENT_STATUS
        .captures(stderr)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u16>().ok())
    {
        return ProviderError::from_status(status, detail);
    }

    let message = format!("exit {}: {}", code_text, detail);
    match code {
        Some(EXIT_TEMPFAIL) => ProviderError::Transient(message),
        // Killed by a signal
        None => ProviderError::Transient(message),
        Some(_) => ProviderError::Fatal(message),
    }
}

/// Read stdout as a JSON reply, or as plain text.
fn parse_reply(stdout: &str, prompt: &str) -> Result<ProviderReply, ProviderError> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return Err(ProviderError::Fatal("command produced no output".to_string()));
    }

    if trimmed.starts_with('{')
        && let Ok(reply) = serde_json::from_str::<CommandReply>(trimmed)
    {
        let tokens_used = reply
            .tokens
            .unwrap_or_else(|| estimate_tokens(prompt.len() + reply.text.len()) as u64);
        return Ok(ProviderReply {
            text: reply.text,
            tokens_used,
        });
    }

    Ok(ProviderReply {
        text: trimmed.to_string(),
        tokens_used: estimate_tokens(prompt.len() + trimmed.len()) as u64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Classification ====================

    #[test]
    fn test_tempfail_is_transient() {
        assert!(classify_failure(Some(75), "try later").is_transient());
    }

    #[test]
    fn test_status_markers() {
        let err = classify_failure(Some(1), "error: HTTP 429 Too Many Requests");
        assert_eq!(
            err,
            ProviderError::Transient("status 429: error: HTTP 429 Too Many Requests".to_string())
        );
        assert!(classify_failure(Some(1), "HTTP/1.1 503 Service Unavailable").is_transient());
        assert!(classify_failure(Some(1), "upstream returned HTTP 502").is_transient());
        assert!(!classify_failure(Some(1), "HTTP 401 Unauthorized").is_transient());
    }

    #[test]
    fn test_other_failures_are_fatal() {
        let err = classify_failure(Some(2), "invalid model name");
        assert_eq!(
            err,
            ProviderError::Fatal("exit 2: invalid model name".to_string())
        );
    }

    // ==================== Reply Parsing ====================

    #[test]
    fn test_parse_json_reply() {
        let reply = parse_reply(r#"{"text": "ANSWER: Yes", "tokens": 321}"#, "prompt").unwrap();
        assert_eq!(reply.text, "ANSWER: Yes");
        assert_eq!(reply.tokens_used, 321);
    }

    #[test]
    fn test_parse_plain_reply() {
        let reply = parse_reply("  ANSWER: No\nCONFIDENCE: 0.8\n", "12345678").unwrap();
        assert_eq!(reply.text, "ANSWER: No\nCONFIDENCE: 0.8");
        assert!(reply.tokens_used > 0);
    }

    #[test]
    fn test_json_without_text_is_plain() {
        let reply = parse_reply(r#"{"answer": "Yes"}"#, "").unwrap();
        assert_eq!(reply.text, r#"{"answer": "Yes"}"#);
    }

    #[test]
    fn test_empty_output_is_fatal() {
        assert!(matches!(
            parse_reply("  \n", ""),
            Err(ProviderError::Fatal(_))
        ));
    }

    // ==================== Process ====================

    fn sh(id: &str, script: &str) -> CommandProvider {
        CommandProvider::new(id, "sh").with_args(vec!["-c".to_string(), script.to_string()])
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_call_passes_request_on_stdin() {
        // Echo the model field back to prove the request arrived.
        let provider = sh(
            "echo",
            r#"input=$(cat); case "$input" in *'"model":"m-1"'*) echo "ANSWER: yes";; *) echo "ANSWER: no";; esac"#,
        );
        let reply = provider
            .call(&ProviderRequest::new("m-1", "Is flood covered?"))
            .await
            .unwrap();
        assert_eq!(reply.text, "ANSWER: yes");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_call_classifies_exit_codes() {
        let transient = sh("t", "cat > /dev/null; echo busy >&2; exit 75");
        let err = transient
            .call(&ProviderRequest::new("m", "p"))
            .await
            .unwrap_err();
        assert!(err.is_transient());

        let fatal = sh("f", "cat > /dev/null; echo 'bad request' >&2; exit 3");
        let err = fatal.call(&ProviderRequest::new("m", "p")).await.unwrap_err();
        assert_eq!(err, ProviderError::Fatal("exit 3: bad request".to_string()));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_call_times_out() {
        let slow = sh("slow", "sleep 5").with_timeout(Duration::from_millis(100));
        let err = slow.call(&ProviderRequest::new("m", "p")).await.unwrap_err();
        assert!(err.is_transient());
        assert!(err.message().contains("timed out"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_covers_unread_large_request() {
        // Far above the pipe buffer, and the command never reads it.
        let prompt = "x".repeat(1024 * 1024);
        let slow = sh("slow", "sleep 5").with_timeout(Duration::from_millis(300));

        let started = std::time::Instant::now();
        let err = slow
            .call(&ProviderRequest::new("m", prompt))
            .await
            .unwrap_err();
        assert!(started.elapsed() < Duration::from_secs(2));
        assert!(err.is_transient());
        assert!(err.message().contains("timed out"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_large_output_before_reading_request() {
        // Fill stderr past the pipe buffer before consuming the request.
        let provider = sh(
            "chatty",
            "head -c 200000 /dev/zero >&2; cat > /dev/null; echo 'ANSWER: yes'",
        );
        let prompt = "y".repeat(512 * 1024);
        let reply = provider
            .call(&ProviderRequest::new("m", prompt))
            .await
            .unwrap();
        assert_eq!(reply.text, "ANSWER: yes");
    }

    #[tokio::test]
    async fn test_missing_program_is_fatal() {
        let provider = CommandProvider::new("missing", "docquorum-no-such-program");
        let err = provider
            .call(&ProviderRequest::new("m", "p"))
            .await
            .unwrap_err();
        assert!(!err.is_transient());
    }
}
