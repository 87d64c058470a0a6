//! # 旁路输出工具
//!
//! 提供统一的终端提示样式。标准输出只承载格式化结果，
//! 因此所有提示、警告和错误都写到标准错误。
//!
//! ## 依赖关系
//! - 被所有 `commands/`、`batch/`、`parsers/` 模块使用
//! - 使用 `colored` crate

use colored::Colorize;

/// 打印成功消息
pub fn print_success(msg: &str) {
    eprintln!("{} {}", "[OK]".green().bold(), msg);
}

/// 打印错误消息
pub fn print_error(msg: &str) {
    eprintln!("{} {}", "[ERR]".red().bold(), msg);
}

/// 打印警告消息
pub fn print_warning(msg: &str) {
    eprintln!("{} {}", "[WARN]".yellow().bold(), msg);
}

/// 打印信息消息
pub fn print_info(msg: &str) {
    eprintln!("{} {}", "[*]".blue().bold(), msg);
}

/// 打印完成消息
pub fn print_done(msg: &str) {
    eprintln!("{} {}", "[DONE]".green().bold(), msg);
}

/// 打印流式模式下单条记录的标题
pub fn print_item_header(index: usize) {
    eprintln!("{}", format!("--- Processing item {} ---", index).dimmed());
}
