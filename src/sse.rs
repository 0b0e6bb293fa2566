//! Server-Sent-Events framing shared by the relay and the client.
//!
//! The relay only ever writes `data:` lines. Each one carries a JSON object
//! with either a `content` delta or an `error` message, and the stream is
//! closed by the literal `[DONE]` sentinel.

use serde_json::{json, Value};

pub const DONE_SENTINEL: &str = "[DONE]";
const DATA_PREFIX: &str = "data:";

/// A single frame written by the relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Content(String),
    Error(String),
    Done,
}

impl Frame {
    pub fn encode(&self) -> String {
        match self {
            Frame::Content(text) => format!("data: {}\n\n", json!({ "content": text })),
            Frame::Error(message) => format!("data: {}\n\n", json!({ "error": message })),
            Frame::Done => format!("data: {}\n\n", DONE_SENTINEL),
        }
    }
}

/// Meaning of a `data:` payload as seen by a consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Delta(String),
    Error(String),
    Done,
    /// Valid JSON without any text, e.g. a role-only upstream delta.
    Ignored,
}

impl Payload {
    pub fn parse(data: &str) -> Self {
        if data.trim() == DONE_SENTINEL {
            return Payload::Done;
        }

        let json: Value = match serde_json::from_str(data) {
            Ok(json) => json,
            // Not JSON: the raw payload is plain text.
            Err(_) => return Payload::Delta(data.to_string()),
        };

        if let Some(content) = json["content"].as_str() {
            return Payload::Delta(content.to_string());
        }
        if let Some(content) = json["choices"][0]["delta"]["content"].as_str() {
            return Payload::Delta(content.to_string());
        }
        if let Some(message) = json["error"].as_str() {
            return Payload::Error(message.to_string());
        }
        if let Some(message) = json["error"]["message"].as_str() {
            return Payload::Error(message.to_string());
        }

        // A bare JSON scalar is still text the user should see.
        match json {
            Value::Object(_) | Value::Array(_) | Value::Null => Payload::Ignored,
            _ => Payload::Delta(data.to_string()),
        }
    }
}

/// Incremental decoder for `data:` lines.
///
/// Bytes are buffered until a full line is available, so frames and multi-byte
/// characters split across network chunks are reassembled before decoding.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds a chunk and returns the payloads of every completed `data:` line.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut payloads = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(data) = data_payload(&line[..line.len() - 1]) {
                payloads.push(data);
            }
        }
        payloads
    }

    /// Flushes a trailing line that was not newline-terminated.
    pub fn finish(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }
        let line = std::mem::take(&mut self.buffer);
        data_payload(&line)
    }
}

fn data_payload(line: &[u8]) -> Option<String> {
    let line = String::from_utf8_lossy(line);
    let line = line.strip_suffix('\r').unwrap_or(&line);
    let data = line.strip_prefix(DATA_PREFIX)?;
    Some(data.strip_prefix(' ').unwrap_or(data).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_encode_as_data_lines() {
        assert_eq!(
            Frame::Content("Hel".into()).encode(),
            "data: {\"content\":\"Hel\"}\n\n"
        );
        assert_eq!(Frame::Done.encode(), "data: [DONE]\n\n");
    }

    #[test]
    fn error_frame_escapes_quotes() {
        let encoded = Frame::Error("bad \"key\"".into()).encode();
        let data = encoded.strip_prefix("data: ").unwrap().trim_end();
        assert_eq!(Payload::parse(data), Payload::Error("bad \"key\"".into()));
    }

    #[test]
    fn decoder_reassembles_split_lines() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"data: {\"cont").is_empty());
        let payloads = decoder.push(b"ent\":\"hi\"}\n\ndata: [DONE]\n\n");
        assert_eq!(payloads, vec!["{\"content\":\"hi\"}", "[DONE]"]);
    }

    #[test]
    fn decoder_reassembles_split_utf8() {
        let text = "data: привет\n".as_bytes();
        let mut decoder = SseDecoder::new();
        // Split inside the two-byte encoding of the first Cyrillic letter.
        assert!(decoder.push(&text[..7]).is_empty());
        assert_eq!(decoder.push(&text[7..]), vec!["привет"]);
    }

    #[test]
    fn decoder_ignores_non_data_lines() {
        let mut decoder = SseDecoder::new();
        let payloads = decoder.push(b": keep-alive\nevent: message\r\ndata:x\r\n");
        assert_eq!(payloads, vec!["x"]);
    }

    #[test]
    fn decoder_flushes_unterminated_line() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"data: tail").is_empty());
        assert_eq!(decoder.finish().as_deref(), Some("tail"));
        assert_eq!(decoder.finish(), None);
    }

    #[test]
    fn payload_kinds() {
        assert_eq!(Payload::parse("[DONE]"), Payload::Done);
        assert_eq!(Payload::parse("Hi there"), Payload::Delta("Hi there".into()));
        assert_eq!(
            Payload::parse(r#"{"choices":[{"delta":{"content":"x"}}]}"#),
            Payload::Delta("x".into())
        );
        assert_eq!(
            Payload::parse(r#"{"choices":[{"delta":{"role":"assistant"}}]}"#),
            Payload::Ignored
        );
        assert_eq!(Payload::parse("42"), Payload::Delta("42".into()));
    }
}
