use refer_core::LibraryError;
use serde_json::Value;
use std::io::{Read, Write};

/// Upper bound on an incoming frame. Real messages carry one reference
/// document and stay far below this; a larger length is a corrupt prefix
/// and must not drive the body allocation.
const MAX_MESSAGE_LEN: usize = 64 * 1024 * 1024;

/// Read one length-prefixed message: a 4-byte unsigned native-endian
/// length followed by that many bytes of UTF-8 JSON.
///
/// `Ok(None)` means the peer closed the stream before a new length
/// arrived, which is the clean shutdown path. A truncated prefix or body,
/// or a malformed body, is a per-message error the caller answers like
/// any other.
pub fn read_message(input: &mut impl Read) -> Result<Option<Value>, LibraryError> {
    let mut prefix = [0u8; 4];
    match fill(input, &mut prefix)? {
        0 => return Ok(None),
        4 => {}
        _ => return Err(LibraryError::Protocol("truncated length prefix".to_string())),
    }

    let len = u32::from_ne_bytes(prefix) as usize;
    if len > MAX_MESSAGE_LEN {
        return Err(LibraryError::Protocol(format!(
            "message length {len} exceeds limit {MAX_MESSAGE_LEN}"
        )));
    }
    let mut body = vec![0u8; len];
    let read = fill(input, &mut body)?;
    if read < len {
        return Err(LibraryError::Protocol(format!(
            "truncated message body: expected {len} bytes, got {read}"
        )));
    }

    Ok(Some(serde_json::from_slice(&body)?))
}

/// Frame and send one reply: compact JSON, 4-byte native-endian length
/// prefix, flushed immediately so the peer never waits on buffering.
pub fn write_message(output: &mut impl Write, payload: &Value) -> Result<(), LibraryError> {
    let body = serde_json::to_vec(payload)?;
    let len = u32::try_from(body.len())
        .map_err(|_| LibraryError::Protocol("reply too large to frame".to_string()))?;

    output.write_all(&len.to_ne_bytes())?;
    output.write_all(&body)?;
    output.flush()?;
    Ok(())
}

/// Read until `buf` is full or the stream ends; returns the byte count.
fn fill(input: &mut impl Read, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut total = 0;
    while total < buf.len() {
        let n = input.read(&mut buf[total..])?;
        if n == 0 {
            break;
        }
        total += n;
    }
    Ok(total)
}
