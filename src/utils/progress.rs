//! # 进度提示工具
//!
//! 封装 `indicatif` 提供统一的 spinner 样式。
//! 批次总数在输入读完之前未知，因此只显示已完成计数。
//!
//! ## 依赖关系
//! - 被 `batch/collator.rs` 使用
//! - 使用 `indicatif`、`console` crate

use indicatif::{ProgressBar, ProgressStyle};

/// 创建批次计数 spinner
///
/// 标准错误不是终端时返回隐藏的进度条，调用方无需区分。
pub fn create_batch_spinner(message: &str) -> ProgressBar {
    if !console::Term::stderr().is_term() {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.green} {elapsed_precise} {pos} {msg}") {
        pb.set_style(style.tick_strings(&["⣾", "⣽", "⣻", "⢿", "⡿", "⣟", "⣯", "⣷"]));
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// 在不打乱进度条的前提下执行输出
pub fn suspend<F: FnOnce()>(pb: &ProgressBar, f: F) {
    if pb.is_hidden() {
        f();
    } else {
        pb.suspend(f);
    }
}
