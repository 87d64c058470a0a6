//! # 命令执行模块
//!
//! 根据配置选择执行路径：并发批处理 或 流式逐条处理。
//!
//! ## 依赖关系
//! - 被 `main.rs` 调用
//! - 使用 `cli/`, `models/`, `batch/`, `parsers/`, `render/`, `utils/`
//! - 子模块: concurrent, stream

pub mod concurrent;
pub mod stream;

use crate::batch::CommandProcessor;
use crate::cli::Cli;
use crate::error::Result;
use crate::models::RunConfig;

use std::io;

/// 执行命令
pub fn run(cli: Cli) -> Result<()> {
    let config = RunConfig::from_args(cli)?;
    let reader = config.input.open()?;
    let processor = CommandProcessor::new(config.command_spec());

    if config.stream {
        stream::run_stream(reader, &config.input.display_name(), &processor, io::stdout())?;
    } else {
        let out = io::BufWriter::new(io::stdout().lock());
        concurrent::run_concurrent(reader, &config, &processor, out)?;
    }
    Ok(())
}
