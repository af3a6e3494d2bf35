// Selection token codec
//
// The only state carried between "ladder shown" and "user picked": a button
// payload of the form `sq|<video reference>|<option index>`. Bounds of the
// index are checked by the caller against a fresh catalog lookup.

use super::errors::PipelineError;
use super::models::VideoReference;

/// Fixed tag identifying quality-selection payloads
pub const SELECTION_TAG: &str = "sq";

const DELIMITER: char = '|';

/// Decoded button payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub reference: VideoReference,
    pub index: usize,
}

pub fn encode(reference: &VideoReference, index: usize) -> String {
    format!(
        "{SELECTION_TAG}{DELIMITER}{}{DELIMITER}{index}",
        reference.as_str()
    )
}

pub fn decode(token: &str) -> Result<Selection, PipelineError> {
    let parts: Vec<&str> = token.split(DELIMITER).collect();
    let [tag, reference, index] = parts.as_slice() else {
        return Err(PipelineError::MalformedToken(format!(
            "expected 3 segments, got {}",
            parts.len()
        )));
    };

    if *tag != SELECTION_TAG {
        return Err(PipelineError::MalformedToken(format!("unknown tag '{tag}'")));
    }

    let index = index
        .parse::<usize>()
        .map_err(|e| PipelineError::MalformedToken(format!("bad index '{index}': {e}")))?;

    Ok(Selection {
        reference: VideoReference::new(*reference),
        index,
    })
}
