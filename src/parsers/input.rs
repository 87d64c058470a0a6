//! # JSON 数组 / JSONL 输入解码器
//!
//! 从字节流中惰性地逐条解码 JSON 值。
//!
//! ## 格式检测
//! 跳过前导空白后窥视第一个有效字节：
//! ```text
//! [ {...}, {...}, ... ]     -> 数组模式，逐元素解码
//! {...}\n\n{...}\n          -> 行模式，每个非空行一个值
//! ```
//! 窥视基于 `BufRead::fill_buf`，检测字节在行模式下保持未消费。
//!
//! ## 错误处理
//! - 单个元素/行解码失败：警告并跳过，序号不前进
//! - 读取错误（非 EOF）：作为致命错误返回，之后迭代结束
//!
//! ## 依赖关系
//! - 被 `commands/` 与 `batch/batcher.rs` 使用
//! - 使用 `models/record.rs`、`utils/output.rs`
//! - 使用 `serde_json` 解码单个值

use crate::error::{LlmBatchError, Result};
use crate::models::Item;
use crate::utils::output;

use serde_json::Value;
use std::io::{self, BufRead};

/// 检测到的输入格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    /// 单个 JSON 数组
    JsonArray,
    /// 换行分隔的 JSON
    JsonLines,
}

impl InputFormat {
    fn label(&self) -> &'static str {
        match self {
            InputFormat::JsonArray => "JSON array",
            InputFormat::JsonLines => "JSONL",
        }
    }
}

/// 数组元素的结束位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Boundary {
    /// 顶层逗号，后面还有元素
    Comma,
    /// 顶层 `]`，数组结束
    Close,
    /// 输入在数组闭合前结束
    Eof,
}

/// 惰性输入解码器，按输入顺序产生 `Item`
pub struct InputDecoder<R: BufRead> {
    reader: R,
    name: String,
    format: InputFormat,
    /// 下一个成功解码记录的序号
    next_seq: usize,
    /// 已读物理行数（行模式）
    line_no: usize,
    /// 已扫描的数组元素数（包括失败的）
    elements: usize,
    skipped: usize,
    done: bool,
}

impl<R: BufRead> InputDecoder<R> {
    /// 检测格式并创建解码器
    ///
    /// 数组模式会消费开头的 `[`；行模式不消费任何有效字节。
    pub fn new(mut reader: R, name: &str) -> Result<Self> {
        let first = peek_first_non_whitespace(&mut reader).map_err(|e| {
            LlmBatchError::InputReadError {
                input: name.to_string(),
                source: e,
            }
        })?;

        let format = if first == Some(b'[') {
            reader.consume(1);
            InputFormat::JsonArray
        } else {
            InputFormat::JsonLines
        };

        Ok(Self {
            reader,
            name: name.to_string(),
            format,
            next_seq: 1,
            line_no: 0,
            elements: 0,
            skipped: 0,
            done: false,
        })
    }

    pub fn format(&self) -> InputFormat {
        self.format
    }

    /// 因解码失败被跳过的元素/行数
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    fn read_error(&self, source: io::Error) -> LlmBatchError {
        LlmBatchError::InputReadError {
            input: self.name.clone(),
            source,
        }
    }

    fn make_item(&mut self, value: Value, raw: &[u8]) -> Item {
        let item = Item {
            seq: self.next_seq,
            value,
            raw: raw.to_vec(),
        };
        self.next_seq += 1;
        item
    }

    fn warn_decode(&mut self, err: LlmBatchError, location: String) {
        self.skipped += 1;
        output::print_warning(&format!("{} ({}). Skipping.", err, location));
    }

    /// 读取下一个数组元素的原始字节，直到顶层 `,` 或 `]`
    fn scan_array_element(&mut self) -> io::Result<(Vec<u8>, Boundary)> {
        let mut raw = Vec::new();
        let mut depth = 0usize;
        let mut in_string = false;
        let mut escaped = false;

        loop {
            let buf = self.reader.fill_buf()?;
            if buf.is_empty() {
                return Ok((raw, Boundary::Eof));
            }

            let mut found = None;
            for (i, &b) in buf.iter().enumerate() {
                if in_string {
                    if escaped {
                        escaped = false;
                    } else if b == b'\\' {
                        escaped = true;
                    } else if b == b'"' {
                        in_string = false;
                    }
                    continue;
                }
                match b {
                    b'"' => in_string = true,
                    b'[' | b'{' => depth += 1,
                    b']' if depth == 0 => {
                        found = Some((i, Boundary::Close));
                        break;
                    }
                    b',' if depth == 0 => {
                        found = Some((i, Boundary::Comma));
                        break;
                    }
                    b']' | b'}' => depth = depth.saturating_sub(1),
                    _ => {}
                }
            }

            match found {
                Some((i, boundary)) => {
                    raw.extend_from_slice(&buf[..i]);
                    self.reader.consume(i + 1);
                    return Ok((raw, boundary));
                }
                None => {
                    let n = buf.len();
                    raw.extend_from_slice(buf);
                    self.reader.consume(n);
                }
            }
        }
    }

    fn next_array_item(&mut self) -> Option<Result<Item>> {
        loop {
            if self.done {
                return None;
            }

            let (raw, boundary) = match self.scan_array_element() {
                Ok(scanned) => scanned,
                Err(e) => {
                    self.done = true;
                    return Some(Err(self.read_error(e)));
                }
            };
            if boundary != Boundary::Comma {
                self.done = true;
            }
            self.elements += 1;
            let index = self.elements;

            let trimmed = raw.trim_ascii();
            if boundary == Boundary::Eof {
                output::print_warning(&format!(
                    "Input {} ended before the JSON array was closed.",
                    self.name
                ));
            }
            if trimmed.is_empty() {
                // `[]` 是合法的空数组，其余空元素（`[1,,2]`、尾随逗号）都是错误
                let empty_array = boundary == Boundary::Close && index == 1;
                if !empty_array && boundary != Boundary::Eof {
                    self.warn_decode(LlmBatchError::EmptyElement, format!("element {}", index));
                }
                continue;
            }

            match serde_json::from_slice::<Value>(trimmed) {
                Ok(value) => return Some(Ok(self.make_item(value, trimmed))),
                Err(source) => {
                    let err = LlmBatchError::DecodeError {
                        format: self.format.label(),
                        source,
                    };
                    self.warn_decode(err, format!("element {}", index));
                }
            }
        }
    }

    fn next_line_item(&mut self) -> Option<Result<Item>> {
        let mut line = Vec::new();
        loop {
            if self.done {
                return None;
            }

            line.clear();
            match self.reader.read_until(b'\n', &mut line) {
                Ok(0) => {
                    self.done = true;
                    return None;
                }
                Ok(_) => self.line_no += 1,
                Err(e) => {
                    self.done = true;
                    return Some(Err(self.read_error(e)));
                }
            }

            let trimmed = line.trim_ascii();
            if trimmed.is_empty() {
                continue;
            }

            match serde_json::from_slice::<Value>(trimmed) {
                Ok(value) => return Some(Ok(self.make_item(value, trimmed))),
                Err(source) => {
                    let err = LlmBatchError::DecodeError {
                        format: self.format.label(),
                        source,
                    };
                    let location = format!("line {}", self.line_no);
                    self.warn_decode(err, location);
                }
            }
        }
    }
}

impl<R: BufRead> Iterator for InputDecoder<R> {
    type Item = Result<Item>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.format {
            InputFormat::JsonArray => self.next_array_item(),
            InputFormat::JsonLines => self.next_line_item(),
        }
    }
}

/// 跳过前导空白，返回第一个有效字节但不消费它
///
/// 流为空（或只有空白）时返回 `None`。
pub fn peek_first_non_whitespace<R: BufRead>(reader: &mut R) -> io::Result<Option<u8>> {
    loop {
        let buf = match reader.fill_buf() {
            Ok(buf) => buf,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        if buf.is_empty() {
            return Ok(None);
        }

        let skip = buf.iter().take_while(|b| b.is_ascii_whitespace()).count();
        if skip < buf.len() {
            let first = buf[skip];
            reader.consume(skip);
            return Ok(Some(first));
        }
        reader.consume(skip);
    }
}

/// 检测到格式后打印提示
pub fn announce_format(format: InputFormat, name: &str, batch_size: usize) {
    match format {
        InputFormat::JsonArray => output::print_info(&format!(
            "Detected JSON array format in {}. Processing in batches of {}...",
            name, batch_size
        )),
        InputFormat::JsonLines => output::print_info(&format!(
            "Assuming JSONL format for {}. Processing in batches of {}...",
            name, batch_size
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::{BufReader, Cursor, Read};

    fn decode(input: &str) -> (InputFormat, Vec<Item>, usize) {
        let mut decoder = InputDecoder::new(Cursor::new(input.as_bytes().to_vec()), "test").unwrap();
        let items: Vec<Item> = decoder.by_ref().map(|r| r.unwrap()).collect();
        (decoder.format(), items, decoder.skipped())
    }

    fn values(items: &[Item]) -> Vec<Value> {
        items.iter().map(|i| i.value.clone()).collect()
    }

    #[test]
    fn test_array_preserves_order() {
        let (format, items, skipped) = decode(r#"[{"a":1},{"a":2},{"a":3}]"#);
        assert_eq!(format, InputFormat::JsonArray);
        assert_eq!(skipped, 0);
        assert_eq!(values(&items), vec![json!({"a":1}), json!({"a":2}), json!({"a":3})]);
        let seqs: Vec<usize> = items.iter().map(|i| i.seq).collect();
        assert_eq!(seqs, vec![1, 2, 3]);
    }

    #[test]
    fn test_array_with_nested_and_tricky_strings() {
        let input = "  \n [ {\"s\": \"a,b]c\"}, [1, [2, 3]],\n \"q\\\"]\\\\\" , null, 4.5e1 ]";
        let (format, items, _) = decode(input);
        assert_eq!(format, InputFormat::JsonArray);
        assert_eq!(
            values(&items),
            vec![
                json!({"s": "a,b]c"}),
                json!([1, [2, 3]]),
                json!("q\"]\\"),
                Value::Null,
                json!(45.0)
            ]
        );
        assert_eq!(items[1].raw, b"[1, [2, 3]]".to_vec());
    }

    #[test]
    fn test_empty_array() {
        let (format, items, skipped) = decode(" [ ] ");
        assert_eq!(format, InputFormat::JsonArray);
        assert!(items.is_empty());
        assert_eq!(skipped, 0);
    }

    #[test]
    fn test_array_skips_malformed_element() {
        let (_, items, skipped) = decode(r#"[1, {bad}, 3]"#);
        assert_eq!(values(&items), vec![json!(1), json!(3)]);
        assert_eq!(items[1].seq, 2);
        assert_eq!(skipped, 1);
    }

    #[test]
    fn test_array_trailing_comma() {
        let (_, items, skipped) = decode("[1, 2,]");
        assert_eq!(values(&items), vec![json!(1), json!(2)]);
        assert_eq!(skipped, 1);
    }

    #[test]
    fn test_array_unterminated() {
        let (_, items, _) = decode("[1, 2");
        assert_eq!(values(&items), vec![json!(1), json!(2)]);
    }

    #[test]
    fn test_array_ignores_trailing_content() {
        let (_, items, _) = decode("[1]\n[2]");
        assert_eq!(values(&items), vec![json!(1)]);
    }

    #[test]
    fn test_jsonl_blank_lines_do_not_affect_numbering() {
        let (format, items, skipped) = decode("{\"x\":1}\n\n   \n{\"x\":2}\r\n");
        assert_eq!(format, InputFormat::JsonLines);
        assert_eq!(skipped, 0);
        assert_eq!(values(&items), vec![json!({"x":1}), json!({"x":2})]);
        assert_eq!(items[0].seq, 1);
        assert_eq!(items[1].seq, 2);
        assert_eq!(items[1].raw, br#"{"x":2}"#.to_vec());
    }

    #[test]
    fn test_jsonl_skips_malformed_line() {
        let (_, items, skipped) = decode("1\nnot json\n3\n");
        assert_eq!(values(&items), vec![json!(1), json!(3)]);
        assert_eq!(items[1].seq, 2);
        assert_eq!(skipped, 1);
    }

    #[test]
    fn test_jsonl_first_byte_not_consumed() {
        let (_, items, _) = decode("  {\"k\":\"v\"}");
        assert_eq!(values(&items), vec![json!({"k":"v"})]);
    }

    #[test]
    fn test_empty_input() {
        let (format, items, skipped) = decode("");
        assert_eq!(format, InputFormat::JsonLines);
        assert!(items.is_empty());
        assert_eq!(skipped, 0);

        let (_, items, _) = decode(" \n\t\n");
        assert!(items.is_empty());
    }

    #[test]
    fn test_object_key_order_preserved() {
        let (_, items, _) = decode(r#"[{"z":1,"a":2,"m":3}]"#);
        assert_eq!(serde_json::to_string(&items[0].value).unwrap(), r#"{"z":1,"a":2,"m":3}"#);
    }

    #[test]
    fn test_small_buffer_chunks() {
        // 每次 fill_buf 只返回 1 字节，元素跨越多个块
        let input = r#"[{"a":[1,2]}, "x,y"]"#;
        let reader = BufReader::with_capacity(1, Cursor::new(input.as_bytes().to_vec()));
        let decoder = InputDecoder::new(reader, "test").unwrap();
        let items: Vec<Value> = decoder.map(|r| r.unwrap().value).collect();
        assert_eq!(items, vec![json!({"a":[1,2]}), json!("x,y")]);
    }

    struct FailingReader {
        data: Cursor<Vec<u8>>,
    }

    impl Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.data.read(buf)? {
                0 => Err(io::Error::new(io::ErrorKind::Other, "disk on fire")),
                n => Ok(n),
            }
        }
    }

    #[test]
    fn test_io_error_is_fatal() {
        let reader = BufReader::new(FailingReader {
            data: Cursor::new(b"{\"a\":1}\n".to_vec()),
        });
        let mut decoder = InputDecoder::new(reader, "broken").unwrap();
        assert!(decoder.next().unwrap().is_ok());
        let err = decoder.next().unwrap().unwrap_err();
        assert!(matches!(err, LlmBatchError::InputReadError { .. }));
        assert!(decoder.next().is_none());
    }
}
