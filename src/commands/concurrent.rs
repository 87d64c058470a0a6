//! # 并发批处理
//!
//! 解码 -> 分批 -> 线程池分发 -> 按序汇总 -> 格式化输出。
//!
//! ## 功能
//! - 自动检测 JSON 数组 / JSONL
//! - 按 `-n` 分批、按 `-c` 并发
//! - 批次乱序完成，输出顺序与输入一致
//! - 失败批次记录警告后跳过
//! - 汇总成功记录数与批次数
//!
//! ## 依赖关系
//! - 被 `commands/mod.rs` 调用
//! - 使用 `parsers/input.rs`, `batch/`, `render/`, `utils/`

use crate::batch::{BatchRunner, Batcher, Collator, Processor, Summary};
use crate::error::Result;
use crate::models::RunConfig;
use crate::parsers::{announce_format, InputDecoder};
use crate::render::create_renderer;
use crate::utils::{output, progress};

use std::io::{BufRead, Write};

/// 一次并发运行的统计
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConcurrentReport {
    /// 生成并提交的批次数
    pub jobs: u64,
    pub summary: Summary,
}

/// 执行并发批处理
pub fn run_concurrent<R, P, W>(
    reader: R,
    config: &RunConfig,
    processor: &P,
    out: W,
) -> Result<ConcurrentReport>
where
    R: BufRead + Send,
    P: Processor + ?Sized,
    W: Write + 'static,
{
    let input_name = config.input.display_name();
    let decoder = InputDecoder::new(reader, &input_name)?;
    announce_format(decoder.format(), &input_name, config.batch_size);

    let batcher = Batcher::new(decoder, config.batch_size);
    let collator = Collator::new(create_renderer(config.format, out))
        .with_progress(progress::create_batch_spinner("batch(es) completed"));

    let run = BatchRunner::new(config.concurrency).run(batcher, processor, |results, aborted| {
        collator.drain(results, aborted)
    })?;

    let mut collation = run.collated;
    let report = ConcurrentReport {
        jobs: run.submitted,
        summary: collation.summary.clone(),
    };

    if report.jobs == 0 {
        output::print_warning(&format!(
            "No JSON items were processed from {}.",
            input_name
        ));
        return Ok(report);
    }

    collation.finish()?;
    print_summary(&report);
    Ok(report)
}

fn print_summary(report: &ConcurrentReport) {
    let summary = &report.summary;
    output::print_success(&format!(
        "Successfully processed {} item(s) in {} batch(es).",
        summary.items_ok, summary.batches_ok
    ));
    if summary.batches_failed > 0 {
        output::print_warning(&format!(
            "{} of {} batch(es) failed ({} item(s) not processed).",
            summary.batches_failed, report.jobs, summary.items_failed
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::OutputFormat;
    use crate::error::LlmBatchError;
    use crate::models::InputSource;
    use crate::render::tests::SharedBuf;
    use serde_json::Value;
    use std::io::Cursor;
    use std::thread;
    use std::time::Duration;

    /// 固定返回 "OK"；负载包含 `fail_marker` 时失败；
    /// 第一个值为数字时按 `base_ms - n` 睡眠，让靠前的批次更晚完成
    struct ScriptedProcessor {
        fail_marker: Option<&'static str>,
        base_ms: u64,
    }

    impl ScriptedProcessor {
        fn ok() -> Self {
            Self {
                fail_marker: None,
                base_ms: 0,
            }
        }
    }

    impl Processor for ScriptedProcessor {
        fn capture(&self, payload: &[u8]) -> Result<String> {
            let values: Vec<Value> = serde_json::from_slice(payload).unwrap();
            if let Some(n) = values.first().and_then(|v| v.get("x")).and_then(Value::as_u64) {
                thread::sleep(Duration::from_millis(self.base_ms.saturating_sub(n * 10)));
            }
            let text = String::from_utf8_lossy(payload);
            if let Some(marker) = self.fail_marker {
                if text.contains(marker) {
                    return Err(LlmBatchError::CommandFailed {
                        command: "scripted".to_string(),
                        status: "exit status: 1".to_string(),
                        stderr: "refused".to_string(),
                    });
                }
            }
            Ok("OK".to_string())
        }

        fn interactive(&self, _payload: &[u8]) -> Result<()> {
            Ok(())
        }
    }

    fn config(concurrency: usize, batch_size: usize, format: OutputFormat) -> RunConfig {
        RunConfig {
            prompt: "p".to_string(),
            profile: None,
            concurrency,
            batch_size,
            format,
            stream: false,
            command: "llm-cli".to_string(),
            input: InputSource::Stdin,
        }
    }

    fn run(
        input: &str,
        config: &RunConfig,
        processor: &ScriptedProcessor,
    ) -> (String, ConcurrentReport) {
        let buf = SharedBuf::default();
        let report = run_concurrent(
            Cursor::new(input.as_bytes().to_vec()),
            config,
            processor,
            buf.clone(),
        )
        .unwrap();
        (buf.text(), report)
    }

    #[test]
    fn test_array_batched_jsonl_output() {
        let (out, report) = run(
            r#"[{"a":1},{"a":2},{"a":3}]"#,
            &config(1, 2, OutputFormat::Jsonl),
            &ScriptedProcessor::ok(),
        );
        assert_eq!(
            out,
            "{\"input\":[{\"a\":1},{\"a\":2}],\"output\":\"OK\"}\n{\"input\":[{\"a\":3}],\"output\":\"OK\"}\n"
        );
        assert_eq!(report.jobs, 2);
        assert_eq!(report.summary.items_ok, 3);
        assert_eq!(report.summary.batches_ok, 2);
    }

    #[test]
    fn test_jsonl_order_kept_under_concurrency() {
        let processor = ScriptedProcessor {
            fail_marker: None,
            base_ms: 60,
        };
        let (out, report) = run(
            "{\"x\":1}\n\n{\"x\":2}\n",
            &config(2, 1, OutputFormat::Jsonl),
            &processor,
        );
        assert_eq!(
            out,
            "{\"input\":[{\"x\":1}],\"output\":\"OK\"}\n{\"input\":[{\"x\":2}],\"output\":\"OK\"}\n"
        );
        assert_eq!(report.jobs, 2);
    }

    #[test]
    fn test_concurrency_does_not_change_output() {
        let input: String = (1..=6).map(|n| format!("{{\"x\":{}}}\n", n)).collect();
        let processor = ScriptedProcessor {
            fail_marker: Some("\"x\":3"),
            base_ms: 60,
        };
        for format in [OutputFormat::Text, OutputFormat::Json, OutputFormat::Jsonl] {
            let (sequential, seq_report) = run(&input, &config(1, 1, format), &processor);
            for workers in [2, 3, 6] {
                let (concurrent, report) = run(&input, &config(workers, 1, format), &processor);
                assert_eq!(concurrent, sequential, "format={} workers={}", format, workers);
                assert_eq!(report, seq_report);
            }
        }
    }

    #[test]
    fn test_failed_batch_is_dropped_but_run_continues() {
        let processor = ScriptedProcessor {
            fail_marker: Some("\"a\":2"),
            base_ms: 0,
        };
        let (out, report) = run(
            r#"[{"a":1},{"a":2},{"a":3}]"#,
            &config(3, 1, OutputFormat::Json),
            &processor,
        );
        assert_eq!(
            out,
            "[{\"input\":[{\"a\":1}],\"output\":\"OK\"},{\"input\":[{\"a\":3}],\"output\":\"OK\"}]\n"
        );
        assert_eq!(report.summary.batches_failed, 1);
        assert_eq!(report.summary.items_ok, 2);
    }

    #[test]
    fn test_text_output() {
        let (out, _) = run("1\n2\n", &config(2, 1, OutputFormat::Text), &ScriptedProcessor::ok());
        assert_eq!(out, "OK\n---\nOK");
    }

    #[test]
    fn test_zero_items_produces_no_output() {
        for format in [OutputFormat::Text, OutputFormat::Json, OutputFormat::Jsonl] {
            let (out, report) = run("  \n", &config(2, 3, format), &ScriptedProcessor::ok());
            assert!(out.is_empty());
            assert_eq!(report.jobs, 0);
            let (out, _) = run("[]", &config(2, 3, format), &ScriptedProcessor::ok());
            assert!(out.is_empty());
        }
    }

    #[test]
    fn test_all_failed_json_is_empty_array() {
        let processor = ScriptedProcessor {
            fail_marker: Some("["),
            base_ms: 0,
        };
        let (out, report) = run("1\n2\n", &config(2, 1, OutputFormat::Json), &processor);
        assert_eq!(out, "[]\n");
        assert_eq!(report.summary.batches_failed, 2);
    }

    #[test]
    fn test_malformed_items_not_counted() {
        let (out, report) = run(
            "{\"x\":1}\nnope\n{\"x\":2}\n",
            &config(1, 5, OutputFormat::Jsonl),
            &ScriptedProcessor::ok(),
        );
        assert_eq!(out, "{\"input\":[{\"x\":1},{\"x\":2}],\"output\":\"OK\"}\n");
        assert_eq!(report.summary.items_ok, 2);
    }

    #[test]
    fn test_rerun_is_byte_identical() {
        let input = r#"[{"k":"v1"},{"k":"v2"},{"k":"v3"},{"k":"v4"}]"#;
        let cfg = config(3, 3, OutputFormat::Json);
        let first = run(input, &cfg, &ScriptedProcessor::ok()).0;
        let second = run(input, &cfg, &ScriptedProcessor::ok()).0;
        assert_eq!(first, second);
    }
}
