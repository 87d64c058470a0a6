//! # 工具函数模块
//!
//! 提供旁路信息输出、进度提示等工具。
//!
//! ## 依赖关系
//! - 被 `commands/`、`batch/`、`parsers/` 模块使用
//! - 子模块: output, progress

pub mod output;
pub mod progress;
