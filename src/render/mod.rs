//! # 输出格式化模块
//!
//! 将按序到达的成功结果渲染为 text / json / jsonl。
//!
//! ## 格式
//! - `text`: 依次打印输出文本，相邻条目之间插入 `---` 分隔行
//! - `json`: 在 `finish` 时一次性写出完整数组
//! - `jsonl`: 每条结果一行 `{"input": [...], "output": "..."}`，逐行刷新
//!
//! 失败的批次从不进入渲染器。
//!
//! ## 依赖关系
//! - 被 `batch/collator.rs` 与 `commands/` 使用
//! - 使用 `models/record.rs` 的 `OutputRecord`
//! - 使用 `serde_json` 序列化

use crate::cli::OutputFormat;
use crate::error::{LlmBatchError, Result};
use crate::models::OutputRecord;

use serde_json::Value;
use std::io::Write;

/// text 模式下的条目分隔
pub const TEXT_SEPARATOR: &str = "\n---\n";

/// 结果渲染器
pub trait Renderer {
    /// 渲染一条成功结果（调用方保证按批次编号顺序）
    fn emit(&mut self, input: &[Value], output: &str) -> Result<()>;

    /// 所有结果到达后调用
    fn finish(&mut self) -> Result<()>;
}

/// 按格式创建渲染器
pub fn create_renderer<W: Write + 'static>(format: OutputFormat, out: W) -> Box<dyn Renderer> {
    match format {
        OutputFormat::Text => Box::new(TextRenderer::new(out)),
        OutputFormat::Json => Box::new(JsonRenderer::new(out)),
        OutputFormat::Jsonl => Box::new(JsonlRenderer::new(out)),
    }
}

fn write_err(e: std::io::Error) -> LlmBatchError {
    LlmBatchError::OutputWriteError(e)
}

/// 纯文本渲染器
pub struct TextRenderer<W: Write> {
    out: W,
    emitted: usize,
}

impl<W: Write> TextRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out, emitted: 0 }
    }
}

impl<W: Write> Renderer for TextRenderer<W> {
    fn emit(&mut self, _input: &[Value], output: &str) -> Result<()> {
        if self.emitted > 0 {
            self.out.write_all(TEXT_SEPARATOR.as_bytes()).map_err(write_err)?;
        }
        self.out.write_all(output.as_bytes()).map_err(write_err)?;
        self.out.flush().map_err(write_err)?;
        self.emitted += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.out.flush().map_err(write_err)
    }
}

/// JSON 数组渲染器，结束时一次性写出
pub struct JsonRenderer<W: Write> {
    out: W,
    records: Vec<Value>,
}

impl<W: Write> JsonRenderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            records: Vec::new(),
        }
    }
}

impl<W: Write> Renderer for JsonRenderer<W> {
    fn emit(&mut self, input: &[Value], output: &str) -> Result<()> {
        let record = serde_json::to_value(OutputRecord { input, output })?;
        self.records.push(record);
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        serde_json::to_writer(&mut self.out, &self.records)?;
        self.out.write_all(b"\n").map_err(write_err)?;
        self.out.flush().map_err(write_err)
    }
}

/// JSONL 渲染器，逐行写出
pub struct JsonlRenderer<W: Write> {
    out: W,
}

impl<W: Write> JsonlRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> Renderer for JsonlRenderer<W> {
    fn emit(&mut self, input: &[Value], output: &str) -> Result<()> {
        let mut line = serde_json::to_vec(&OutputRecord { input, output })?;
        line.push(b'\n');
        self.out.write_all(&line).map_err(write_err)?;
        self.out.flush().map_err(write_err)
    }

    fn finish(&mut self) -> Result<()> {
        self.out.flush().map_err(write_err)
    }
}
