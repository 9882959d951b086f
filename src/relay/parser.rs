//! Extraction of the metadata markers embedded in event text.
//!
//! Producers append `(urlId: <digits>)` (required) and `(tagId: <digits>)`
//! (optional) to the message text. The body sent to readers is the payload
//! with the first `urlId` marker removed and surrounding whitespace trimmed.

use once_cell::sync::Lazy;
use regex::Regex;
use relay_error::{RelayError, RelayResult};

use crate::message::ParsedEvent;

static CONTENT_ID_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(urlId: (\d+)\)").expect("valid content id pattern"));

static TAG_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(tagId: (\d+)\)").expect("valid tag pattern"));

/// Parse an event payload.
///
/// A payload without the content id marker cannot be relayed and yields
/// [`RelayError::MalformedEvent`].
pub fn parse_event(payload: &str) -> RelayResult<ParsedEvent> {
    let content = CONTENT_ID_MARKER
        .captures(payload)
        .ok_or_else(|| RelayError::MalformedEvent("missing (urlId: N) marker".to_string()))?;

    let marker = content.get(0).map(|m| m.as_str()).unwrap_or_default();
    let content_id = content
        .get(1)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default();

    let tag = TAG_MARKER
        .captures(payload)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string());

    let body = payload.replacen(marker, "", 1).trim().to_string();

    Ok(ParsedEvent {
        content_id,
        tag,
        body,
    })
}
