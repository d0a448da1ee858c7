//! Content-Length framing of JSON-RPC messages

use gorig_foundation::{GorigError, GorigResult};
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Largest body accepted from the server
pub const MAX_CONTENT_LENGTH: usize = 64 * 1024 * 1024;

/// Parse the Content-Length header from one header line
fn parse_content_length(line: &str) -> Option<usize> {
    let (name, value) = line.split_once(':')?;
    if !name.trim().eq_ignore_ascii_case("Content-Length") {
        return None;
    }
    value.trim().parse().ok()
}

/// Read the body of one framed message
///
/// Returns `Ok(None)` on a clean end of stream between messages. Headers
/// other than Content-Length are skipped. Errors mean the framing itself
/// is broken and the stream cannot be resynchronised.
pub async fn read_frame<R>(reader: &mut R) -> GorigResult<Option<Vec<u8>>>
where
    R: AsyncBufRead + Unpin,
{
    let mut content_length = None;
    let mut line = String::new();

    loop {
        line.clear();
        if reader.read_line(&mut line).await? == 0 {
            return match content_length {
                None => Ok(None),
                Some(_) => Err(GorigError::lsp("stream ended inside message headers")),
            };
        }

        let header = line.trim();
        if header.is_empty() {
            if content_length.is_some() {
                break;
            }
            continue;
        }
        if let Some(length) = parse_content_length(header) {
            content_length = Some(length);
        }
    }

    let length = content_length.unwrap_or_default();
    if length > MAX_CONTENT_LENGTH {
        return Err(GorigError::lsp(format!(
            "message of {} bytes exceeds the {} byte limit",
            length, MAX_CONTENT_LENGTH
        )));
    }
    let mut body = vec![0u8; length];
    reader.read_exact(&mut body).await?;
    Ok(Some(body))
}

/// Read and parse one framed message
pub async fn read_message<R>(reader: &mut R) -> GorigResult<Option<Value>>
where
    R: AsyncBufRead + Unpin,
{
    match read_frame(reader).await? {
        Some(body) => Ok(Some(serde_json::from_slice(&body)?)),
        None => Ok(None),
    }
}

/// Frame `message` for the wire
pub fn encode_message(message: &Value) -> GorigResult<Vec<u8>> {
    let content = serde_json::to_vec(message)?;
    let mut framed = format!("Content-Length: {}\r\n\r\n", content.len()).into_bytes();
    framed.extend_from_slice(&content);
    Ok(framed)
}

/// Write one framed message and flush
pub async fn write_message<W>(writer: &mut W, message: &Value) -> GorigResult<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(&encode_message(message)?).await?;
    writer.flush().await?;
    Ok(())
}
