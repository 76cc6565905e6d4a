//! `text/event-stream` decoding for chat-completion deltas.

use futures_util::{Stream, StreamExt};
use serde::Deserialize;

use super::{AiError, DeltaStream};

/// Splits a byte stream into lines; a line may span several chunks.
#[derive(Debug, Default)]
pub struct LineDecoder {
    buf: Vec<u8>,
}

impl LineDecoder {
    /// Feed one chunk and return the complete, non-empty lines it finished.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(chunk);
        let mut lines = Vec::new();
        while let Some(pos) = self.buf.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.buf.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&raw).trim().to_string();
            if !line.is_empty() {
                lines.push(line);
            }
        }
        lines
    }

    /// Whatever is left once the upstream closed without a trailing newline.
    pub fn finish(&mut self) -> Option<String> {
        let rest = String::from_utf8_lossy(&std::mem::take(&mut self.buf)).trim().to_string();
        (!rest.is_empty()).then_some(rest)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseLine {
    Delta(String),
    Done,
    /// comments, other fields, empty deltas
    Skip,
}

#[derive(Deserialize)]
struct Chunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
}

#[derive(Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: Delta,
}

#[derive(Deserialize, Default)]
struct Delta {
    #[serde(default)]
    content: Option<String>,
}

pub fn parse_line(line: &str) -> SseLine {
    let Some(data) = line.strip_prefix("data:") else {
        return SseLine::Skip;
    };
    let data = data.trim();
    if data == "[DONE]" {
        return SseLine::Done;
    }
    match serde_json::from_str::<Chunk>(data) {
        Ok(chunk) => chunk
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.delta.content)
            .filter(|c| !c.is_empty())
            .map(SseLine::Delta)
            .unwrap_or(SseLine::Skip),
        Err(e) => {
            tracing::debug!(error = %e, "skip unparsable stream chunk");
            SseLine::Skip
        }
    }
}

/// Content deltas of an upstream completion stream; ends at `[DONE]` or end of body.
pub fn deltas<S, B, E>(body: S) -> DeltaStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Into<AiError> + Send + 'static,
{
    Box::pin(async_stream::stream! {
        let mut decoder = LineDecoder::default();
        let mut body = Box::pin(body);
        while let Some(chunk) = body.next().await {
            let chunk = match chunk {
                Ok(c) => c,
                Err(e) => {
                    yield Err::<String, AiError>(e.into());
                    return;
                }
            };
            for line in decoder.push(chunk.as_ref()) {
                match parse_line(&line) {
                    SseLine::Delta(text) => yield Ok(text),
                    SseLine::Done => return,
                    SseLine::Skip => {}
                }
            }
        }
        if let Some(line) = decoder.finish() {
            if let SseLine::Delta(text) = parse_line(&line) {
                yield Ok(text);
            }
        }
    })
}
