//! # llm-batch - JSON 记录批量 LLM 处理工具
//!
//! 从文件或标准输入流式读取 JSON 数组 / JSONL 记录，分批交给外部 LLM 命令
//! (缺省 `llm-cli`) 并发处理，再按输入顺序输出结果。
//!
//! ## 执行路径
//! - 批处理: 解码 -> 分批 -> 工作线程池 -> 按序汇总 -> text / json / jsonl
//! - 流式 (`--stream`): 逐条调用，命令输出直连终端
//!
//! ## 依赖关系
//! ```text
//! main.rs
//!   ├── cli/        (命令行参数定义)
//!   ├── commands/   (执行流程: concurrent, stream)
//!   │     ├── parsers/   (输入格式检测与解码)
//!   │     ├── batch/     (分批、线程池、重排序、汇总)
//!   │     ├── render/    (输出格式)
//!   │     └── models/    (数据模型与运行配置)
//!   ├── utils/      (旁路输出、进度提示)
//!   └── error.rs    (错误处理)
//! ```

mod batch;
mod cli;
mod commands;
mod error;
mod models;
mod parsers;
mod render;
mod utils;

use clap::Parser;
use cli::Cli;

fn main() {
    // Initialize colored output for Windows compatibility
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let cli = Cli::parse();

    if let Err(e) = commands::run(cli) {
        utils::output::print_error(&error_chain(&e));
        std::process::exit(1);
    }
}

/// 拼接错误及其来源链
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut msg = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !msg.contains(&text) {
            msg.push_str(": ");
            msg.push_str(&text);
        }
        source = cause.source();
    }
    msg
}
