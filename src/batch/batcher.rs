//! # 分批器
//!
//! 将解码器产生的有序记录流按批大小切分为 `Job`。
//!
//! ## 功能
//! - 满 `batch_size` 条即生成一个批次
//! - 流结束时输出不足一批的尾批
//! - 批次内容预先序列化为 JSON 数组（批大小为 1 时也是数组）
//! - 批次编号从 1 开始连续分配；序列化失败的批次不占用编号
//!
//! ## 依赖关系
//! - 被 `commands/concurrent.rs` 调用
//! - 使用 `models/record.rs`、`utils/output.rs`

use crate::error::Result;
use crate::models::{Item, Job};
use crate::utils::output;

use serde_json::Value;

/// 分批迭代器
pub struct Batcher<I> {
    items: I,
    batch_size: usize,
    next_id: u64,
    pending: Vec<Value>,
    done: bool,
}

impl<I> Batcher<I>
where
    I: Iterator<Item = Result<Item>>,
{
    pub fn new(items: I, batch_size: usize) -> Self {
        let batch_size = batch_size.max(1);
        Self {
            items,
            batch_size,
            next_id: 1,
            pending: Vec::with_capacity(batch_size),
            done: false,
        }
    }

    /// 将当前累积的记录封装为批次
    fn finalize(&mut self) -> Option<Job> {
        if self.pending.is_empty() {
            return None;
        }
        let items = std::mem::replace(&mut self.pending, Vec::with_capacity(self.batch_size));

        match serde_json::to_vec(&items) {
            Ok(payload) => {
                let job = Job {
                    id: self.next_id,
                    items,
                    payload,
                };
                self.next_id += 1;
                Some(job)
            }
            Err(e) => {
                output::print_warning(&format!(
                    "Error marshalling batch of {} item(s): {}. Skipping.",
                    items.len(),
                    e
                ));
                None
            }
        }
    }
}

impl<I> Iterator for Batcher<I>
where
    I: Iterator<Item = Result<Item>>,
{
    type Item = Result<Job>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            match self.items.next() {
                Some(Ok(item)) => {
                    self.pending.push(item.value);
                    if self.pending.len() >= self.batch_size {
                        if let Some(job) = self.finalize() {
                            return Some(Ok(job));
                        }
                    }
                }
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(e));
                }
                None => {
                    self.done = true;
                    return self.finalize().map(Ok);
                }
            }
        }
        None
    }
}
