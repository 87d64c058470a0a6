//! # 重排序缓冲区
//!
//! 按任意顺序接收带编号的条目，按编号升序释放。
//!
//! 维护低水位 `next`：编号 `next` 到达后，连同其后已缓存的连续编号一并释放。
//! 失败的编号以 `None` 登记，只推进低水位，不产生输出。
//!
//! ## 依赖关系
//! - 被 `batch/collator.rs` 使用
//! - 无外部模块依赖

use std::collections::BTreeMap;

/// 重排序缓冲区，编号从 1 开始
#[derive(Debug)]
pub struct ReorderBuffer<T> {
    next: u64,
    pending: BTreeMap<u64, Option<T>>,
}

impl<T> Default for ReorderBuffer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ReorderBuffer<T> {
    pub fn new() -> Self {
        Self {
            next: 1,
            pending: BTreeMap::new(),
        }
    }

    /// 登记编号 `id` 的条目，返回现在可以按序释放的所有条目
    ///
    /// 已释放或重复的编号被忽略。
    pub fn push(&mut self, id: u64, entry: Option<T>) -> Vec<T> {
        if id < self.next || self.pending.contains_key(&id) {
            return Vec::new();
        }
        self.pending.insert(id, entry);

        let mut released = Vec::new();
        while let Some(entry) = self.pending.remove(&self.next) {
            self.next += 1;
            if let Some(value) = entry {
                released.push(value);
            }
        }
        released
    }

    /// 尚未释放的条目数
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// 下一个期望的编号
    pub fn next_expected(&self) -> u64 {
        self.next
    }
}
