//! # 数据模型模块
//!
//! 定义流水线各阶段传递的数据和运行配置。
//!
//! ## 依赖关系
//! - 被 `parsers/`、`batch/`、`render/`、`commands/` 使用
//! - 子模块: record, config

pub mod config;
pub mod record;

pub use config::{CommandSpec, InputSource, RunConfig};
pub use record::{BatchOutcome, Item, Job, OutputRecord};
