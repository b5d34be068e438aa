//! Newline-delimited JSON framing
//!
//! One complete envelope per line. Reads go through a buffered reader, so a
//! frame split across several underlying reads is reassembled before parsing;
//! a line that does not parse as an envelope fails with `MalformedMessage`
//! rather than tearing down the stream.

use crate::error::{WireError, WireResult};
use crate::protocol::Envelope;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// Encode one envelope as a newline-terminated JSON line
pub fn encode(envelope: &Envelope) -> WireResult<String> {
    let mut line =
        serde_json::to_string(envelope).map_err(|e| WireError::Serialization(e.to_string()))?;
    line.push('\n');
    Ok(line)
}

/// Decode one line into an envelope
///
/// Fails with `MalformedMessage` when the line is not valid JSON, is missing
/// required fields (`id` on responses, `name` and `arguments` on `call_tool`
/// requests), or is a response carrying neither a result nor an error.
pub fn decode(line: &str) -> WireResult<Envelope> {
    let trimmed = line.trim();
    let envelope: Envelope =
        serde_json::from_str(trimmed).map_err(|e| WireError::malformed(e.to_string()))?;

    if let Envelope::Response(response) = &envelope {
        if response.result.is_none() && response.error.is_none() {
            return Err(WireError::malformed(
                "response carries neither result nor error",
            ));
        }
    }

    Ok(envelope)
}

/// Read the next envelope from `reader`
///
/// Returns `Ok(None)` at end of input. A line that fails to parse yields
/// `MalformedMessage` with the line already consumed, so the caller can skip
/// it and keep reading; I/O faults surface as `Io`.
pub async fn read_envelope<R>(reader: &mut R) -> WireResult<Option<Envelope>>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    let n = reader
        .read_until(b'\n', &mut buf)
        .await
        .map_err(|e| WireError::Io(e.to_string()))?;
    if n == 0 {
        return Ok(None);
    }

    let line =
        String::from_utf8(buf).map_err(|_| WireError::malformed("frame is not valid UTF-8"))?;
    decode(&line).map(Some)
}
