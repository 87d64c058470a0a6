//! # 流水线记录模型
//!
//! 解码器产生 `Item`，分批器产生 `Job`，工作线程产生 `BatchOutcome`，
//! 输出格式化使用 `OutputRecord`。所有记录创建后不可变，
//! 同一时刻只归一个阶段所有。
//!
//! ## 依赖关系
//! - 被 `parsers/`、`batch/`、`render/` 使用
//! - 使用 `serde`、`serde_json`

use crate::error::Result;
use serde::Serialize;
use serde_json::Value;

/// 解码得到的单条输入记录
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    /// 成功解码的序号（从 1 开始）
    pub seq: usize,
    /// 解码后的 JSON 值
    pub value: Value,
    /// 该值在输入中的原始字节（已去除首尾空白）
    pub raw: Vec<u8>,
}

/// 一个待分发的批次
#[derive(Debug, Clone)]
pub struct Job {
    /// 批次编号（从 1 开始连续递增）
    pub id: u64,
    /// 批次内的原始记录值
    pub items: Vec<Value>,
    /// 预先序列化好的 JSON 数组
    pub payload: Vec<u8>,
}

/// 单个批次的处理结果
#[derive(Debug)]
pub struct BatchOutcome {
    pub id: u64,
    pub input: Vec<Value>,
    /// 外部命令输出，或失败原因
    pub output: Result<String>,
}

impl BatchOutcome {
    pub fn is_success(&self) -> bool {
        self.output.is_ok()
    }
}

/// 结构化输出中的一条记录：`{"input": [...], "output": "..."}`
#[derive(Debug, Serialize)]
pub struct OutputRecord<'a> {
    pub input: &'a [Value],
    pub output: &'a str,
}
