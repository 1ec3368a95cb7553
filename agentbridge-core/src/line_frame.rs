use agentbridge_types::SessionError;
use serde_json::Value;
use tokio::io::AsyncBufRead;
use tokio::io::AsyncBufReadExt;
use tokio::io::BufReader;
use tokio::io::Lines;

/// Turns a child's stdout into a lazy sequence of parsed JSON objects.
///
/// Blank lines and lines that don't start with `{` are silently dropped —
/// every adapter's executable occasionally interleaves banner text or log
/// noise with its JSONL stream. A `{`-prefixed line that fails to parse is
/// the one case treated as fatal.
pub struct LineFrame<R> {
    lines: Lines<BufReader<R>>,
    adapter: &'static str,
}

impl<R: AsyncBufRead + Unpin> LineFrame<R> {
    pub fn new(reader: R, adapter: &'static str) -> Self
    where
        R: Sized,
    {
        Self {
            lines: BufReader::new(reader).lines(),
            adapter,
        }
    }

    /// Returns the next framed JSON object, `None` at EOF, or a fatal
    /// `SessionError::Framing` if a `{`-prefixed line fails to parse.
    pub async fn next_frame(&mut self) -> Option<Result<Value, SessionError>> {
        loop {
            let line = match self.lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => return None,
                Err(source) => return Some(Err(SessionError::Io(source))),
            };
            let trimmed = line.trim_start();
            if trimmed.is_empty() || !trimmed.starts_with('{') {
                continue;
            }
            return match serde_json::from_str::<Value>(trimmed) {
                Ok(value) => Some(Ok(value)),
                Err(source) => Some(Err(SessionError::Framing {
                    adapter: self.adapter,
                    message: source.to_string(),
                })),
            };
        }
    }
}

// `Lines::next_line` already treats unterminated trailing data at EOF as a
// final line, which is the behavior contract (d) in SPEC_FULL.md asks for.
impl<R> LineFrame<R> {
    pub fn adapter(&self) -> &'static str {
        self.adapter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn skips_blank_and_non_json_lines() {
        let input = b"\nhello world\n{\"type\":\"init\"}\n" as &[u8];
        let mut frame = LineFrame::new(input, "agent-a");
        let value = frame.next_frame().await.unwrap().unwrap();
        assert_eq!(value["type"], "init");
        assert!(frame.next_frame().await.is_none());
    }

    #[tokio::test]
    async fn malformed_json_is_fatal() {
        let input = b"{not json}\n" as &[u8];
        let mut frame = LineFrame::new(input, "agent-a");
        let err = frame.next_frame().await.unwrap().unwrap_err();
        assert!(matches!(err, SessionError::Framing { .. }));
    }

    #[tokio::test]
    async fn unterminated_trailing_line_is_read() {
        let input = b"{\"type\":\"init\"}" as &[u8];
        let mut frame = LineFrame::new(input, "agent-a");
        let value = frame.next_frame().await.unwrap().unwrap();
        assert_eq!(value["type"], "init");
    }
}
