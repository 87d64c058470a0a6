//! # 结果汇总器
//!
//! 以任意完成顺序接收批次结果，按批次编号顺序交给渲染器。
//!
//! ## 功能
//! - 失败批次：记录错误、计数，不进入输出
//! - 成功批次：经 `ReorderBuffer` 按序释放给渲染器
//! - 统计成功记录数与成功/失败批次数
//!
//! 所有计数只在消费者线程上更新，工作线程只产生不可变结果。
//!
//! ## 依赖关系
//! - 被 `commands/concurrent.rs` 调用
//! - 使用 `batch/reorder.rs`、`render/`、`utils/output.rs`、`utils/progress.rs`

use crate::batch::reorder::ReorderBuffer;
use crate::error::{LlmBatchError, Result};
use crate::models::BatchOutcome;
use crate::render::Renderer;
use crate::utils::{output, progress};

use crossbeam_channel::Receiver;
use indicatif::ProgressBar;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};

/// 批量处理结果统计
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Summary {
    /// 成功批次中的记录数
    pub items_ok: usize,
    /// 失败批次中的记录数
    pub items_failed: usize,
    /// 成功批次数
    pub batches_ok: usize,
    /// 失败批次数
    pub batches_failed: usize,
}

impl Summary {
    /// 合并一个批次结果
    pub fn merge(&mut self, outcome: &BatchOutcome) {
        if outcome.is_success() {
            self.batches_ok += 1;
            self.items_ok += outcome.input.len();
        } else {
            self.batches_failed += 1;
            self.items_failed += outcome.input.len();
        }
    }

    /// 总批次数
    pub fn total(&self) -> usize {
        self.batches_ok + self.batches_failed
    }
}

/// 汇总完成后交回给调用方
pub struct Collation {
    pub summary: Summary,
    pub renderer: Box<dyn Renderer>,
    /// 渲染过程中的写出错误（之后不再写出）
    pub error: Option<LlmBatchError>,
}

/// 结果汇总器
pub struct Collator {
    reorder: ReorderBuffer<(Vec<Value>, String)>,
    renderer: Box<dyn Renderer>,
    summary: Summary,
    error: Option<LlmBatchError>,
    pb: ProgressBar,
}

impl Collator {
    pub fn new(renderer: Box<dyn Renderer>) -> Self {
        Self {
            reorder: ReorderBuffer::new(),
            renderer,
            summary: Summary::default(),
            error: None,
            pb: ProgressBar::hidden(),
        }
    }

    /// 显示已完成批次计数
    pub fn with_progress(mut self, pb: ProgressBar) -> Self {
        self.pb = pb;
        self
    }

    /// 接收一个结果
    pub fn accept(&mut self, outcome: BatchOutcome) {
        self.summary.merge(&outcome);
        self.pb.inc(1);

        let BatchOutcome { id, input, output: result } = outcome;
        let entry = match result {
            Ok(text) => Some((input, text)),
            Err(e) => {
                progress::suspend(&self.pb, || {
                    output::print_error(&format!("Error processing batch {}: {}. Skipping.", id, e))
                });
                None
            }
        };

        for (input, text) in self.reorder.push(id, entry) {
            self.emit(&input, &text);
        }
    }

    fn emit(&mut self, input: &[Value], text: &str) {
        if self.error.is_some() {
            return;
        }
        if let Err(e) = self.renderer.emit(input, text) {
            self.error = Some(e);
        }
    }

    /// 消费通道直到关闭；中止标志置位后只排空不输出
    pub fn drain(mut self, results: Receiver<BatchOutcome>, aborted: &AtomicBool) -> Collation {
        for outcome in results.iter() {
            if aborted.load(Ordering::SeqCst) {
                continue;
            }
            self.accept(outcome);
        }
        self.finish_progress();
        self.into_collation()
    }

    fn finish_progress(&self) {
        self.pb.finish_and_clear();
        if self.reorder.pending() > 0 {
            output::print_warning(&format!(
                "{} batch result(s) never became releasable (waiting for batch {}).",
                self.reorder.pending(),
                self.reorder.next_expected()
            ));
        }
    }

    pub fn into_collation(self) -> Collation {
        Collation {
            summary: self.summary,
            renderer: self.renderer,
            error: self.error,
        }
    }
}

impl Collation {
    /// 完成渲染（json 格式此时才写出）
    pub fn finish(&mut self) -> Result<()> {
        if let Some(e) = self.error.take() {
            return Err(e);
        }
        self.renderer.finish()
    }
}
