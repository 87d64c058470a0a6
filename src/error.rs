//! # 统一错误处理模块
//!
//! 定义 llm-batch 的所有错误类型，使用 `thiserror` 派生。
//!
//! 致命错误（参数、输入 I/O）向上传播到 `main.rs` 直接退出；
//! 可恢复错误（单条解码、单批调用、序列化）在各阶段内转为警告。
//!
//! ## 依赖关系
//! - 被所有其他模块使用
//! - 无外部模块依赖

use thiserror::Error;

/// llm-batch 统一错误类型
#[derive(Error, Debug)]
pub enum LlmBatchError {
    // ─────────────────────────────────────────────────────────────
    // I/O 错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to read file: {path}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Error reading from input {input}")]
    InputReadError {
        input: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write output")]
    OutputWriteError(#[source] std::io::Error),

    // ─────────────────────────────────────────────────────────────
    // 输入解码错误
    // ─────────────────────────────────────────────────────────────
    #[error("Error decoding {format} item: {source}")]
    DecodeError {
        format: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Empty element in JSON array")]
    EmptyElement,

    // ─────────────────────────────────────────────────────────────
    // 外部命令错误
    // ─────────────────────────────────────────────────────────────
    #[error("Error starting {command}: {source}. Is {command} installed and in your PATH?")]
    CommandNotFound {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Error starting {command}: {source}")]
    CommandSpawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Error writing to {command} stdin: {source}")]
    StdinWrite {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{command} exited with an error: {status}\nstderr: {stderr}")]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("{command} exited with an error: {status}")]
    CommandExited { command: String, status: String },

    // ─────────────────────────────────────────────────────────────
    // 参数错误
    // ─────────────────────────────────────────────────────────────
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // ─────────────────────────────────────────────────────────────
    // 序列化错误
    // ─────────────────────────────────────────────────────────────
    #[error("JSON serialization failed: {0}")]
    SerializeError(#[from] serde_json::Error),

    // ─────────────────────────────────────────────────────────────
    // 其他
    // ─────────────────────────────────────────────────────────────
    #[error("Worker pool error: {0}")]
    PoolError(String),
}

/// Result 类型别名
pub type Result<T> = std::result::Result<T, LlmBatchError>;
