//! Large-object materialisation.
//!
//! Character and binary large objects arrive as stream handles. Projection wants plain
//! values, so both are read into memory here. Reading is best effort: a failing stream
//! leaves the original handle in place and the query carries on.

use std::io::Read;

use crate::types::{BinaryLargeObject, CharacterLargeObject, RowValues};

/// Replace large-object handles with their in-memory content; other values pass through.
#[must_use]
pub fn normalize(value: RowValues) -> RowValues {
    match value {
        RowValues::Clob(handle) => match read_characters(handle.as_ref()) {
            Ok(text) => RowValues::Text(text),
            Err(err) => {
                tracing::warn!(error = %err, "failed to read character large object");
                RowValues::Clob(handle)
            }
        },
        RowValues::BlobHandle(handle) => match read_bytes(handle.as_ref()) {
            Ok(bytes) => RowValues::Blob(bytes),
            Err(err) => {
                tracing::warn!(error = %err, "failed to read binary large object");
                RowValues::BlobHandle(handle)
            }
        },
        other => other,
    }
}

/// Lines are appended back to back. `\n`, `\r\n`, and a lone `\r` all end a line.
fn read_characters(handle: &dyn CharacterLargeObject) -> std::io::Result<String> {
    let mut out = String::new();
    handle.character_stream()?.read_to_string(&mut out)?;
    out.retain(|c| c != '\n' && c != '\r');
    Ok(out)
}

/// Largest reported length a binary large object may claim before it is left as a handle.
const MAX_BLOB_BYTES: u64 = i32::MAX as u64;

/// The buffer is sized from the reported length; a short stream leaves zeroed tail bytes.
fn read_bytes(handle: &dyn BinaryLargeObject) -> std::io::Result<Vec<u8>> {
    let reported = handle.length()?;
    let too_large = || {
        std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("binary large object too large: {reported} bytes"),
        )
    };
    if reported > MAX_BLOB_BYTES {
        return Err(too_large());
    }
    let len = usize::try_from(reported).map_err(|_| too_large())?;
    let mut body = Vec::new();
    body.try_reserve_exact(len).map_err(std::io::Error::other)?;
    handle.binary_stream()?.take(reported).read_to_end(&mut body)?;
    body.resize(len, 0);
    Ok(body)
}
