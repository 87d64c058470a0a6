//! # 解析器模块
//!
//! 提供输入流的格式检测与逐条解码。
//!
//! ## 依赖关系
//! - 被 `commands/` 与 `batch/` 模块使用
//! - 使用 `models/` 数据模型
//! - 子模块: input

pub mod input;

pub use input::{announce_format, InputDecoder};
