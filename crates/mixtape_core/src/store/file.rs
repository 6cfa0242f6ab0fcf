//! File-system read/write helpers.
//!
//! # Side effects
//! - Emit `store_read` / `store_write` logging events with duration and status.

use super::{StoreError, StoreResult};
use log::{error, info};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::{Serializer, Value};
use std::path::Path;
use std::time::Instant;

const OUTPUT_INDENT: &[u8] = b"    ";

/// Reads and parses one JSON input file.
///
/// `parameter` names the input (`mixtape`, `changes`) in errors.
///
/// # Errors
/// - `MissingInput` when `path` does not exist.
/// - `Io` / `Json` when the file cannot be read or parsed.
pub fn read_document_value(
    path: impl AsRef<Path>,
    parameter: &'static str,
) -> StoreResult<Value> {
    let path = path.as_ref();
    let started_at = Instant::now();
    info!(
        "event=store_read module=store status=start parameter={} path={}",
        parameter,
        path.display()
    );

    if !path.exists() {
        error!(
            "event=store_read module=store status=error parameter={} error_code=missing_input path={}",
            parameter,
            path.display()
        );
        return Err(StoreError::MissingInput {
            parameter,
            path: path.to_path_buf(),
        });
    }

    let raw = std::fs::read(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let value = serde_json::from_slice(&raw).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    info!(
        "event=store_read module=store status=ok parameter={} bytes={} duration_ms={}",
        parameter,
        raw.len(),
        started_at.elapsed().as_millis()
    );
    Ok(value)
}

/// Renders a JSON tree with 4-space indentation and a trailing newline.
pub fn render_document_value(value: &Value) -> Result<Vec<u8>, serde_json::Error> {
    let mut buffer = Vec::new();
    let mut serializer =
        Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(OUTPUT_INDENT));
    value.serialize(&mut serializer)?;
    buffer.push(b'\n');
    Ok(buffer)
}

/// Writes the result document, replacing any existing file.
pub fn write_document_value(path: impl AsRef<Path>, value: &Value) -> StoreResult<()> {
    let path = path.as_ref();
    let started_at = Instant::now();

    let rendered = render_document_value(value).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    if let Err(source) = std::fs::write(path, &rendered) {
        error!(
            "event=store_write module=store status=error error_code=write_failed path={} error={}",
            path.display(),
            source
        );
        return Err(StoreError::Io {
            path: path.to_path_buf(),
            source,
        });
    }

    info!(
        "event=store_write module=store status=ok bytes={} duration_ms={} path={}",
        rendered.len(),
        started_at.elapsed().as_millis(),
        path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::render_document_value;
    use serde_json::json;

    #[test]
    fn render_uses_four_space_indent_and_trailing_newline() {
        let rendered = render_document_value(&json!({"users": [{"user_id": "1"}]})).unwrap();
        let text = String::from_utf8(rendered).unwrap();

        assert_eq!(
            text,
            "{\n    \"users\": [\n        {\n            \"user_id\": \"1\"\n        }\n    ]\n}\n"
        );
    }
}
