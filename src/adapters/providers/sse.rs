//! Server-sent event parsing for streaming chat completions.

use serde::Deserialize;

/// What a single SSE line means to the stream consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseEvent {
    /// A text delta to forward.
    Delta(String),
    /// The `[DONE]` sentinel.
    Done,
    /// Blank lines, comments, role-only chunks and unparseable payloads.
    Skip,
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: StreamDelta,
}

#[derive(Debug, Default, Deserialize)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
}

/// Parse one line of an SSE body.
pub fn parse_sse_line(line: &str) -> SseEvent {
    let Some(payload) = line.trim_end_matches('\r').strip_prefix("data:") else {
        return SseEvent::Skip;
    };
    let payload = payload.trim();

    if payload == "[DONE]" {
        return SseEvent::Done;
    }

    match serde_json::from_str::<StreamChunk>(payload) {
        Ok(chunk) => chunk
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.delta.content)
            .filter(|text| !text.is_empty())
            .map_or(SseEvent::Skip, SseEvent::Delta),
        Err(_) => SseEvent::Skip,
    }
}

/// Reassembles lines from arbitrarily split byte chunks.
///
/// Bytes are buffered until a newline arrives, so a UTF-8 character split
/// across chunks is decoded whole.
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and drain every complete line.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            lines.push(decode_line(&line));
        }
        lines
    }

    /// Whatever is left once the body ends without a trailing newline.
    pub fn finish(self) -> Option<String> {
        let rest = decode_line(&self.pending);
        (!rest.is_empty()).then_some(rest)
    }
}

fn decode_line(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .trim_end_matches(['\n', '\r'])
        .to_string()
}
