/// One field line of a `text/event-stream` body.
#[derive(Debug, PartialEq, Eq)]
pub enum SseField {
    Event(String),
    Data(String),
    Id(String),
    Retry(String),
}

/// Parse a single SSE line. Comments (`:` prefix) and unknown fields give `None`.
/// SSE format: `field: value`, the space after the colon being optional.
pub fn parse_sse_line(line: &str) -> Option<SseField> {
    if line.starts_with(':') {
        return None;
    }
    let (name, value) = match line.split_once(':') {
        Some((name, value)) => (name, value.strip_prefix(' ').unwrap_or(value)),
        None => (line, ""),
    };
    let value = value.to_string();
    match name {
        "event" => Some(SseField::Event(value)),
        "data" => Some(SseField::Data(value)),
        "id" => Some(SseField::Id(value)),
        "retry" => Some(SseField::Retry(value)),
        _ => None,
    }
}

/// Incremental decoder turning raw body chunks into complete message payloads.
///
/// Chunks may split lines (or UTF-8 sequences) anywhere; partial lines stay
/// buffered until their newline arrives. A blank line dispatches the message,
/// and its `data:` lines are joined with `\n`.
#[derive(Debug, Default)]
pub struct SseDecoder {
    line_buf: Vec<u8>,
    data: Vec<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk; returns the data of every message completed by it.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        self.line_buf.extend_from_slice(chunk);

        let mut messages = Vec::new();
        while let Some(pos) = self.line_buf.iter().position(|&b| b == b'\n') {
            let mut line: Vec<u8> = self.line_buf.drain(..=pos).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            let line = String::from_utf8_lossy(&line);

            if line.is_empty() {
                if !self.data.is_empty() {
                    messages.push(std::mem::take(&mut self.data).join("\n"));
                }
                continue;
            }

            // event/id/retry carry nothing we act on; retry in particular is
            // ignored because the stream is never reopened.
            if let Some(SseField::Data(data)) = parse_sse_line(&line) {
                self.data.push(data);
            }
        }
        messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fields_with_and_without_space() {
        assert_eq!(parse_sse_line("data: [1]"), Some(SseField::Data("[1]".into())));
        assert_eq!(parse_sse_line("data:[1]"), Some(SseField::Data("[1]".into())));
        assert_eq!(parse_sse_line("event: snapshot"), Some(SseField::Event("snapshot".into())));
        assert_eq!(parse_sse_line("retry: 3000"), Some(SseField::Retry("3000".into())));
    }

    #[test]
    fn comments_and_unknown_fields_are_ignored() {
        assert_eq!(parse_sse_line(": keep-alive"), None);
        assert_eq!(parse_sse_line("colour: blue"), None);
    }

    #[test]
    fn dispatches_on_blank_line() {
        let mut dec = SseDecoder::new();
        assert!(dec.feed(b"data: [{\"a\":1}]\n").is_empty());
        assert_eq!(dec.feed(b"\n"), vec![r#"[{"a":1}]"#.to_string()]);
    }

    #[test]
    fn message_split_across_chunks() {
        let mut dec = SseDecoder::new();
        assert!(dec.feed(b"da").is_empty());
        assert!(dec.feed(b"ta: [\"x\"").is_empty());
        assert_eq!(dec.feed(b"]\n\n"), vec![r#"["x"]"#.to_string()]);
    }

    #[test]
    fn crlf_line_endings() {
        let mut dec = SseDecoder::new();
        let out = dec.feed(b"data: []\r\n\r\ndata: [1]\r\n\r\n");
        assert_eq!(out, vec!["[]".to_string(), "[1]".to_string()]);
    }

    #[test]
    fn multi_line_data_is_joined() {
        let mut dec = SseDecoder::new();
        let out = dec.feed(b"data: [\ndata: 1]\n\n");
        assert_eq!(out, vec!["[\n1]".to_string()]);
    }

    #[test]
    fn utf8_split_inside_a_character() {
        // "é" is 0xC3 0xA9
        let mut dec = SseDecoder::new();
        assert!(dec.feed(&[b'd', b'a', b't', b'a', b':', b' ', 0xC3]).is_empty());
        assert_eq!(dec.feed(&[0xA9, b'\n', b'\n']), vec!["é".to_string()]);
    }

    #[test]
    fn blank_lines_without_data_dispatch_nothing() {
        let mut dec = SseDecoder::new();
        assert!(dec.feed(b": ping\n\n\n").is_empty());
    }
}
