//! # 运行配置
//!
//! 将命令行参数校验并归一化为 `RunConfig`。
//!
//! ## 功能
//! - 流式模式强制 `-c=1`、`-n=1`、`-o=text`（逐项警告）
//! - 校验并发数、批大小
//! - 系统提示词二选一（字面量 / 文件）
//! - 构造外部命令调用参数
//!
//! ## 依赖关系
//! - 使用 `cli/mod.rs` 定义的参数
//! - 被 `commands/` 使用

use crate::cli::{Cli, OutputFormat};
use crate::error::{LlmBatchError, Result};
use crate::utils::output;

use std::fs::{self, File};
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;

/// 输入来源
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    Stdin,
    File(PathBuf),
}

impl InputSource {
    /// 用于提示信息的输入名
    pub fn display_name(&self) -> String {
        match self {
            InputSource::Stdin => "stdin".to_string(),
            InputSource::File(path) => path.display().to_string(),
        }
    }

    /// 打开带缓冲的输入流
    pub fn open(&self) -> Result<Box<dyn BufRead + Send>> {
        match self {
            InputSource::Stdin => Ok(Box::new(BufReader::new(io::stdin()))),
            InputSource::File(path) => {
                let file = File::open(path).map_err(|e| LlmBatchError::FileReadError {
                    path: path.display().to_string(),
                    source: e,
                })?;
                Ok(Box::new(BufReader::new(file)))
            }
        }
    }
}

/// 外部命令调用规格
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// llm-cli 风格的调用：`prompt --system-prompt <P> --user-prompt-file - [--profile L] [--stream]`
    pub fn llm_cli(program: &str, prompt: &str, profile: Option<&str>, stream: bool) -> Self {
        let mut args = vec![
            "prompt".to_string(),
            "--system-prompt".to_string(),
            prompt.to_string(),
            "--user-prompt-file".to_string(),
            "-".to_string(),
        ];
        if let Some(profile) = profile {
            args.push("--profile".to_string());
            args.push(profile.to_string());
        }
        if stream {
            args.push("--stream".to_string());
        }
        Self::new(program, args)
    }
}

/// 归一化后的运行配置
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub prompt: String,
    pub profile: Option<String>,
    pub concurrency: usize,
    pub batch_size: usize,
    pub format: OutputFormat,
    pub stream: bool,
    pub command: String,
    pub input: InputSource,
}

impl RunConfig {
    /// 从命令行参数构造配置
    pub fn from_args(args: Cli) -> Result<Self> {
        let mut concurrency = args.concurrency;
        let mut batch_size = args.lines;
        let mut format = args.format;

        if args.stream {
            for warning in force_stream_settings(&mut concurrency, &mut batch_size, &mut format) {
                output::print_warning(warning);
            }
        }

        if concurrency < 1 {
            return Err(LlmBatchError::InvalidArgument(
                "Concurrency (-c) must be at least 1.".to_string(),
            ));
        }
        if batch_size < 1 {
            return Err(LlmBatchError::InvalidArgument(
                "Batch size (-n) must be at least 1.".to_string(),
            ));
        }

        let prompt = resolve_prompt(args.system_prompt.as_deref(), args.prompt_file.as_ref())?;

        let input = match args.input {
            Some(path) => InputSource::File(path),
            None => InputSource::Stdin,
        };

        Ok(Self {
            prompt,
            profile: args.profile.filter(|p| !p.is_empty()),
            concurrency,
            batch_size,
            format,
            stream: args.stream,
            command: args.command,
            input,
        })
    }

    /// 当前配置下的外部命令调用
    pub fn command_spec(&self) -> CommandSpec {
        CommandSpec::llm_cli(
            &self.command,
            &self.prompt,
            self.profile.as_deref(),
            self.stream,
        )
    }
}

/// 流式模式下覆盖并发、批大小和格式，返回需要提示的警告
fn force_stream_settings(
    concurrency: &mut usize,
    batch_size: &mut usize,
    format: &mut OutputFormat,
) -> Vec<&'static str> {
    let mut warnings = Vec::new();
    if *concurrency != 1 {
        warnings.push("Stream mode enabled. Forcing concurrency to 1.");
        *concurrency = 1;
    }
    if *format != OutputFormat::Text {
        warnings.push("Stream mode enabled. Forcing output format to 'text'.");
        *format = OutputFormat::Text;
    }
    if *batch_size != 1 {
        warnings.push("Stream mode enabled. Forcing batch size (-n) to 1.");
        *batch_size = 1;
    }
    warnings
}

/// 解析系统提示词：字面量与文件必须恰好提供一个
fn resolve_prompt(literal: Option<&str>, file: Option<&PathBuf>) -> Result<String> {
    let literal = literal.filter(|s| !s.is_empty());
    match (literal, file) {
        (Some(text), None) => Ok(text.to_string()),
        (None, Some(path)) => fs::read_to_string(path).map_err(|e| LlmBatchError::FileReadError {
            path: path.display().to_string(),
            source: e,
        }),
        _ => Err(LlmBatchError::InvalidArgument(
            "A system prompt is required. Use either -P or -F to provide one, but not both."
                .to_string(),
        )),
    }
}
