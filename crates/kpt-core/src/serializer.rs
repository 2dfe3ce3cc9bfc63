use crate::error::{Error, Result};
use crate::types::{PatchFile, PatchStatus};

/// Rebuild the full text of a patch file from its original text and the
/// current option statuses. Only the recorded status-token spans are touched;
/// every other byte is copied through unchanged. Produces text only, never
/// writes to disk.
pub fn render(file: &PatchFile) -> Result<String> {
    let text = &file.text;
    let mut out = String::with_capacity(text.len() + file.options.len());
    let mut cursor = 0usize;

    for option in &file.options {
        let span = option.status_span;

        if span.start < cursor {
            return Err(serialize_error(
                file,
                format!(
                    "status span for '{}' at byte {} overlaps the previous option",
                    option.name, span.start
                ),
            ));
        }
        let Some(between) = text.get(cursor..span.start) else {
            return Err(serialize_error(
                file,
                format!(
                    "status span for '{}' at byte {} is outside the file text",
                    option.name, span.start
                ),
            ));
        };
        let Some(original) = text.get(span.start..span.end()) else {
            return Err(serialize_error(
                file,
                format!(
                    "status span for '{}' at byte {} is outside the file text",
                    option.name, span.start
                ),
            ));
        };
        if PatchStatus::from_token(original).is_none() {
            return Err(serialize_error(
                file,
                format!(
                    "expected a status token at byte {} for '{}', found {:?}",
                    span.start, option.name, original
                ),
            ));
        }

        out.push_str(between);
        out.push_str(option.status.as_token());
        cursor = span.end();
    }

    out.push_str(&text[cursor..]);
    Ok(out)
}

fn serialize_error(file: &PatchFile, message: String) -> Error {
    Error::Serialize {
        path: file.path.clone(),
        message,
    }
}
