//! # 批量执行器
//!
//! 固定大小的工作线程池，并发地把批次交给外部命令处理。
//!
//! ## 功能
//! - 生产者线程：解码 + 分批，写入有界任务通道
//! - `workers` 个工作线程（rayon 线程池）：逐个取任务、调用处理器、发送结果
//! - 消费者在调用线程上运行，读取结果通道直到所有工作线程退出
//! - 输入读取出现致命错误时设置中止标志，工作线程不再处理新任务
//!
//! ## 通道关闭顺序
//! ```text
//! 生产者耗尽输入 -> drop(job_tx)
//!   -> 工作线程取完剩余任务后退出 -> 各自 drop(result_tx)
//!   -> 消费者的接收循环结束
//! ```
//!
//! ## 依赖关系
//! - 被 `commands/concurrent.rs` 调用
//! - 使用 `batch/process.rs` 的 `Processor`
//! - 使用 `rayon` 线程池、`crossbeam-channel` 通道

use crate::batch::process::Processor;
use crate::error::{LlmBatchError, Result};
use crate::models::{BatchOutcome, Job};

use crossbeam_channel::{bounded, Receiver, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

/// 一次运行的结果
#[derive(Debug)]
pub struct PoolRun<T> {
    /// 提交给线程池的批次数
    pub submitted: u64,
    /// 消费者的返回值
    pub collated: T,
}

/// 批量执行器
pub struct BatchRunner {
    /// 并行工作线程数
    workers: usize,
}

impl BatchRunner {
    /// 创建新的批量执行器
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    /// 运行流水线
    ///
    /// `consume` 在当前线程上接收结果（任意完成顺序），并可通过中止标志
    /// 得知输入已发生致命错误。
    pub fn run<J, P, C, T>(&self, jobs: J, processor: &P, consume: C) -> Result<PoolRun<T>>
    where
        J: Iterator<Item = Result<Job>> + Send,
        P: Processor + ?Sized,
        C: FnOnce(Receiver<BatchOutcome>, &AtomicBool) -> T,
    {
        // 配置 rayon 线程池
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .thread_name(|i| format!("worker-{}", i + 1))
            .build()
            .map_err(|e| LlmBatchError::PoolError(e.to_string()))?;

        let (job_tx, job_rx) = bounded::<Job>(self.workers);
        let (result_tx, result_rx) = bounded::<BatchOutcome>(self.workers * 2);
        let aborted = AtomicBool::new(false);

        thread::scope(|scope| -> Result<PoolRun<T>> {
            let aborted = &aborted;
            let producer = thread::Builder::new()
                .name("producer".to_string())
                .spawn_scoped(scope, move || produce(jobs, job_tx, aborted))
                .map_err(|e| LlmBatchError::PoolError(e.to_string()))?;

            let collated = pool.in_place_scope(|s| {
                for _ in 0..self.workers {
                    let job_rx = job_rx.clone();
                    let result_tx = result_tx.clone();
                    s.spawn(move |_| work(job_rx, result_tx, processor, aborted));
                }
                drop(job_rx);
                drop(result_tx);
                consume(result_rx, aborted)
            });

            let submitted = producer
                .join()
                .map_err(|_| LlmBatchError::PoolError("producer thread panicked".to_string()))??;

            Ok(PoolRun {
                submitted,
                collated,
            })
        })
    }
}

/// 生产者：按顺序提交批次，返回提交数
fn produce<J>(jobs: J, job_tx: Sender<Job>, aborted: &AtomicBool) -> Result<u64>
where
    J: Iterator<Item = Result<Job>>,
{
    let mut submitted = 0;
    for job in jobs {
        match job {
            Ok(job) => {
                if job_tx.send(job).is_err() {
                    break;
                }
                submitted += 1;
            }
            Err(e) => {
                aborted.store(true, Ordering::SeqCst);
                return Err(e);
            }
        }
    }
    Ok(submitted)
}

/// 工作线程：每个任务恰好产生一个结果
fn work<P>(jobs: Receiver<Job>, results: Sender<BatchOutcome>, processor: &P, aborted: &AtomicBool)
where
    P: Processor + ?Sized,
{
    for job in jobs.iter() {
        if aborted.load(Ordering::SeqCst) {
            continue;
        }
        let output = processor.capture(&job.payload);
        let outcome = BatchOutcome {
            id: job.id,
            input: job.items,
            output,
        };
        if results.send(outcome).is_err() {
            break;
        }
    }
}
