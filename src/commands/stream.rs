//! # 流式逐条处理
//!
//! 绕过线程池，一次处理一条记录；外部命令的输出直接显示在终端上。
//!
//! ## 功能
//! - 与批处理相同的 JSON 数组 / JSONL 自动检测
//! - 每条记录以原始字节送入外部命令（不包装为数组）
//! - 记录之间打印 `---` 分隔行
//! - 单条失败只记录错误，继续处理下一条
//!
//! ## 依赖关系
//! - 被 `commands/mod.rs` 调用
//! - 使用 `parsers/input.rs`, `batch/process.rs`, `utils/output.rs`

use crate::batch::Processor;
use crate::error::{LlmBatchError, Result};
use crate::parsers::InputDecoder;
use crate::render::TEXT_SEPARATOR;
use crate::utils::output;

use std::io::{BufRead, Write};

/// 流式运行统计
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StreamReport {
    /// 尝试处理的记录数
    pub items: usize,
    /// 处理失败的记录数
    pub failed: usize,
    /// 解码失败被跳过的记录数
    pub skipped: usize,
}

/// 执行流式处理
pub fn run_stream<R, P, W>(reader: R, input_name: &str, processor: &P, mut out: W) -> Result<StreamReport>
where
    R: BufRead,
    P: Processor + ?Sized,
    W: Write,
{
    output::print_info(&format!(
        "Stream mode enabled. Processing items from {} sequentially...",
        input_name
    ));

    let mut decoder = InputDecoder::new(reader, input_name)?;
    let mut report = StreamReport::default();

    for item in decoder.by_ref() {
        let item = item?;
        report.items += 1;

        if report.items > 1 {
            out.write_all(TEXT_SEPARATOR.as_bytes())
                .and_then(|_| out.flush())
                .map_err(LlmBatchError::OutputWriteError)?;
        }

        output::print_item_header(item.seq);
        if let Err(e) = processor.interactive(&item.raw) {
            report.failed += 1;
            output::print_error(&format!("Error processing item {}: {}", item.seq, e));
        }
    }
    report.skipped = decoder.skipped();

    output::print_done(&format!("Finished processing {} item(s).", report.items));
    if report.failed > 0 {
        output::print_warning(&format!("{} item(s) failed.", report.failed));
    }
    if report.skipped > 0 {
        output::print_warning(&format!(
            "{} malformed item(s) skipped.",
            report.skipped
        ));
    }
    Ok(report)
}
