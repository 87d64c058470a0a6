//! # 外部命令调用
//!
//! 将 JSON 负载写入外部命令的标准输入并收集结果。
//!
//! ## 功能
//! - `capture`: 捕获完整的标准输出与标准错误（批处理模式）
//! - `interactive`: 标准输出/错误直连终端（流式模式）
//! - 标准输入由独立线程写入后关闭，避免子进程输出过多时互相阻塞
//!
//! ## 依赖关系
//! - 被 `batch/runner.rs` 与 `commands/stream.rs` 使用
//! - 使用 `models/config.rs` 的 `CommandSpec`

use crate::error::{LlmBatchError, Result};
use crate::models::CommandSpec;

use std::io::{self, Write};
use std::process::{Child, ChildStdin, Command, ExitStatus, Stdio};
use std::thread;

/// 批次处理器：接收 JSON 负载，返回文本输出
pub trait Processor: Sync {
    /// 捕获输出模式
    fn capture(&self, payload: &[u8]) -> Result<String>;

    /// 直连终端模式，不捕获输出
    fn interactive(&self, payload: &[u8]) -> Result<()>;
}

/// 基于子进程的处理器
pub struct CommandProcessor {
    spec: CommandSpec,
}

impl CommandProcessor {
    pub fn new(spec: CommandSpec) -> Self {
        Self { spec }
    }

    fn spawn(&self, stdout: Stdio, stderr: Stdio) -> Result<Child> {
        Command::new(&self.spec.program)
            .args(&self.spec.args)
            .stdin(Stdio::piped())
            .stdout(stdout)
            .stderr(stderr)
            .spawn()
            .map_err(|e| {
                let command = self.spec.program.clone();
                if e.kind() == io::ErrorKind::NotFound {
                    LlmBatchError::CommandNotFound { command, source: e }
                } else {
                    LlmBatchError::CommandSpawn { command, source: e }
                }
            })
    }

    fn check_write(&self, result: thread::Result<io::Result<()>>) -> Result<()> {
        match result {
            Ok(Ok(())) => Ok(()),
            // 子进程可以不读完输入就退出
            Ok(Err(e)) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
            Ok(Err(e)) => Err(LlmBatchError::StdinWrite {
                command: self.spec.program.clone(),
                source: e,
            }),
            Err(_) => Err(LlmBatchError::PoolError(
                "stdin writer thread panicked".to_string(),
            )),
        }
    }

    fn status_error(&self, status: ExitStatus, stderr: Option<String>) -> LlmBatchError {
        let command = self.spec.program.clone();
        let status = status.to_string();
        match stderr {
            Some(stderr) => LlmBatchError::CommandFailed {
                command,
                status,
                stderr,
            },
            None => LlmBatchError::CommandExited { command, status },
        }
    }
}

impl Processor for CommandProcessor {
    fn capture(&self, payload: &[u8]) -> Result<String> {
        let mut child = self.spawn(Stdio::piped(), Stdio::piped())?;
        let stdin = child.stdin.take();

        let (output, written) = thread::scope(|s| {
            let writer = s.spawn(move || write_payload(stdin, payload));
            let output = child.wait_with_output();
            (output, writer.join())
        });

        let output = output.map_err(|e| LlmBatchError::CommandSpawn {
            command: self.spec.program.clone(),
            source: e,
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            return Err(self.status_error(output.status, Some(stderr)));
        }
        self.check_write(written)?;

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn interactive(&self, payload: &[u8]) -> Result<()> {
        let mut child = self.spawn(Stdio::inherit(), Stdio::inherit())?;
        let stdin = child.stdin.take();

        let (status, written) = thread::scope(|s| {
            let writer = s.spawn(move || write_payload(stdin, payload));
            let status = child.wait();
            (status, writer.join())
        });

        let status = status.map_err(|e| LlmBatchError::CommandSpawn {
            command: self.spec.program.clone(),
            source: e,
        })?;

        if !status.success() {
            return Err(self.status_error(status, None));
        }
        self.check_write(written)
    }
}

/// 写入负载并关闭标准输入
fn write_payload(stdin: Option<ChildStdin>, payload: &[u8]) -> io::Result<()> {
    if let Some(mut stdin) = stdin {
        stdin.write_all(payload)?;
        stdin.flush()?;
    }
    Ok(())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn sh(script: &str) -> CommandProcessor {
        CommandProcessor::new(CommandSpec::new(
            "sh",
            vec!["-c".to_string(), script.to_string()],
        ))
    }

    #[test]
    fn test_capture_echoes_stdin() {
        let processor = CommandProcessor::new(CommandSpec::new("cat", vec![]));
        let output = processor.capture(br#"[{"a":1}]"#).unwrap();
        assert_eq!(output, r#"[{"a":1}]"#);
    }

    #[test]
    fn test_capture_large_payload() {
        // 负载远大于管道缓冲区
        let payload = vec![b'x'; 1 << 20];
        let processor = CommandProcessor::new(CommandSpec::new("cat", vec![]));
        let output = processor.capture(&payload).unwrap();
        assert_eq!(output.len(), payload.len());
    }

    #[test]
    fn test_capture_nonzero_exit_carries_stderr() {
        let err = sh("echo oops >&2; exit 3").capture(b"[]").unwrap_err();
        match err {
            LlmBatchError::CommandFailed { command, stderr, .. } => {
                assert_eq!(command, "sh");
                assert_eq!(stderr.trim(), "oops");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_command_not_found() {
        let processor = CommandProcessor::new(CommandSpec::new(
            "llm-batch-definitely-missing-binary",
            vec![],
        ));
        let err = processor.capture(b"[]").unwrap_err();
        assert!(matches!(err, LlmBatchError::CommandNotFound { .. }));
        assert!(err.to_string().contains("PATH"));
    }

    #[test]
    fn test_command_ignoring_stdin_succeeds() {
        let output = sh("echo OK").capture(&vec![b'x'; 1 << 20]).unwrap();
        assert_eq!(output, "OK\n");
    }

    #[test]
    fn test_interactive_status() {
        assert!(sh("cat > /dev/null").interactive(b"{}").is_ok());
        let err = sh("exit 1").interactive(b"{}").unwrap_err();
        assert!(matches!(err, LlmBatchError::CommandExited { .. }));
    }
}
