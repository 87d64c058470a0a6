//! # CLI 模块
//!
//! 使用 `clap` 定义命令行参数。
//!
//! ## 参数结构
//! - 系统提示词: `-P` 字面量 或 `-F` 文件（二选一）
//! - 执行控制: `-c` 并发数, `-n` 批大小, `--stream` 流式模式
//! - 输出: `-o/--format` (text | json | jsonl)
//! - 位置参数: 输入文件（缺省读取标准输入）
//!
//! ## 依赖关系
//! - 被 `main.rs` 使用
//! - 参数传递给 `models/config.rs` 做校验与归一化

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// 外部命令的缺省程序名
pub const DEFAULT_COMMAND: &str = "llm-cli";

/// llm-batch - 将 JSON 数组 / JSONL 记录分批送入 LLM 命令
#[derive(Parser, Debug)]
#[command(name = "llm-batch")]
#[command(author = "Changjiang Wu")]
#[command(version)]
#[command(
    about = "Process JSON array/JSONL data by sending each item or batch to an LLM command",
    long_about = None
)]
pub struct Cli {
    /// The system prompt text
    #[arg(short = 'P', long = "system-prompt", value_name = "PROMPT")]
    pub system_prompt: Option<String>,

    /// Path to a file containing the system prompt
    #[arg(short = 'F', long = "prompt-file", value_name = "FILE")]
    pub prompt_file: Option<PathBuf>,

    /// Name of the llm-cli profile to use
    #[arg(short = 'L', long)]
    pub profile: Option<String>,

    /// Number of concurrent processes
    #[arg(short = 'c', long, default_value_t = 1)]
    pub concurrency: usize,

    /// Number of items to batch together for each LLM call
    #[arg(short = 'n', long = "lines", default_value_t = 1)]
    pub lines: usize,

    /// Output format
    #[arg(short = 'o', long = "format", visible_alias = "output", value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Enable stream mode. Forces -c=1, -n=1 and -o=text
    #[arg(long, default_value_t = false)]
    pub stream: bool,

    /// External command that receives each batch on stdin
    #[arg(long, env = "LLM_BATCH_COMMAND", default_value = DEFAULT_COMMAND)]
    pub command: String,

    /// Input JSON array or JSONL file. Reads from stdin if omitted
    pub input: Option<PathBuf>,
}

/// 输出格式
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    /// Plain output text separated by '---'
    Text,
    /// One JSON array written at the end
    Json,
    /// One JSON object per line
    Jsonl,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Jsonl => write!(f, "jsonl"),
        }
    }
}
