//! # 批量处理模块
//!
//! 提供分批、并发分发、重排序与汇总能力。
//!
//! ## 功能
//! - 按批大小切分记录流
//! - 固定大小工作线程池调用外部命令
//! - 乱序完成、按序输出
//! - 成功/失败统计
//!
//! ## 依赖关系
//! - 被 `commands/` 模块使用
//! - 使用 `rayon` 线程池与 `crossbeam-channel` 通道
//! - 使用 `indicatif` 显示进度

pub mod batcher;
pub mod collator;
pub mod process;
pub mod reorder;
pub mod runner;

pub use batcher::Batcher;
pub use collator::{Collator, Summary};
pub use process::{CommandProcessor, Processor};
pub use runner::BatchRunner;
