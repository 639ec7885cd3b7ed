//! Best-effort decoding of the model's structured payload.

use serde_json::{Map, Value};
use tracing::warn;

use crate::base::{error::ExtractError, types::ExtractedEvent};

/// What to do with a completion that is not a JSON object at all.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DecodePolicy {
    /// Treat it as a relevant event with every field empty.
    #[default]
    Lenient,
    /// Fail the request with [`ExtractError::Decode`].
    Strict,
}

impl DecodePolicy {
    /// Strict when `strict` is set.
    pub fn from_strict(strict: bool) -> Self {
        if strict { Self::Strict } else { Self::Lenient }
    }
}

/// Decode `content` into event fields.
///
/// Missing or non-string fields become empty strings. `message` is left empty for the caller
/// to back-fill.
pub fn decode_event(content: &str, policy: DecodePolicy) -> Result<ExtractedEvent, ExtractError> {
    let Some(object) = find_object(content) else {
        return match policy {
            DecodePolicy::Lenient => {
                warn!("Completion is not a JSON object; continuing with empty fields.");
                Ok(ExtractedEvent::default())
            }
            DecodePolicy::Strict => Err(ExtractError::Decode(format!("expected a JSON object, got `{}`", content.trim()))),
        };
    };

    Ok(ExtractedEvent {
        name: string_field(&object, "name"),
        date: string_field(&object, "date"),
        location: string_field(&object, "location"),
        url: string_field(&object, "url"),
        message: String::new(),
    })
}

/// Locate a JSON object in the completion: the whole text, a fenced code block, or the
/// outermost braces inside surrounding prose.
fn find_object(content: &str) -> Option<Map<String, Value>> {
    let trimmed = content.trim();
    let unfenced = strip_code_fence(trimmed);

    let braced = match (unfenced.find('{'), unfenced.rfind('}')) {
        (Some(start), Some(end)) if start < end => Some(&unfenced[start..=end]),
        _ => None,
    };

    [Some(trimmed), Some(unfenced), braced]
        .into_iter()
        .flatten()
        .find_map(|candidate| match serde_json::from_str::<Value>(candidate) {
            Ok(Value::Object(object)) => Some(object),
            _ => None,
        })
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };

    let rest = rest.trim_end();
    let rest = rest.strip_suffix("```").unwrap_or(rest);

    // Drop the info string (e.g. `json`) on the opening fence, unless the payload starts right there.
    match rest.split_once('\n') {
        Some((info, body)) if !info.contains('{') => body.trim(),
        _ => rest.trim(),
    }
}

fn string_field(object: &Map<String, Value>, key: &str) -> String {
    match object.get(key) {
        Some(Value::String(value)) => value.trim().to_string(),
        Some(Value::Null) | None => String::new(),
        Some(other) => {
            warn!("Ignoring non-string `{key}` in payload: {other}");
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decodes_all_fields() {
        let event = decode_event(
            r#"{"name":"Team Lunch","date":"2024-01-12T12:00:00-05:00","location":"Cafe Luna","url":"https://x.co"}"#,
            DecodePolicy::Lenient,
        )
        .unwrap();

        assert_eq!(event.name, "Team Lunch");
        assert_eq!(event.date, "2024-01-12T12:00:00-05:00");
        assert_eq!(event.location, "Cafe Luna");
        assert_eq!(event.url, "https://x.co");
        assert!(event.message.is_empty());
    }

    #[test]
    fn test_missing_and_mistyped_fields_default_to_empty() {
        let event = decode_event(r#"{"name": 42, "location": null, "extra": true, "url": "https://x.co"}"#, DecodePolicy::Strict).unwrap();

        assert_eq!(event, ExtractedEvent { url: "https://x.co".to_string(), ..Default::default() });
    }

    #[test]
    fn test_empty_object_is_all_empty_under_both_policies() {
        for policy in [DecodePolicy::Lenient, DecodePolicy::Strict] {
            assert_eq!(decode_event("{}", policy).unwrap(), ExtractedEvent::default());
        }
    }

    #[test]
    fn test_unparseable_payload_is_lenient_by_default() {
        for content in ["", "   ", "Sure! Here you go.", "[1, 2, 3]", "\"just a string\"", "{\"name\": "] {
            assert_eq!(decode_event(content, DecodePolicy::default()).unwrap(), ExtractedEvent::default(), "{content:?}");
        }
    }

    #[test]
    fn test_unparseable_payload_fails_when_strict() {
        for content in ["", "Sure! Here you go.", "[1, 2, 3]", "{\"name\": "] {
            let err = decode_event(content, DecodePolicy::Strict).unwrap_err();
            assert!(matches!(err, ExtractError::Decode(_)), "{content:?}");
        }
    }

    #[test]
    fn test_tolerates_code_fences() {
        let content = "```json\n{\"name\": \"Picnic\", \"location\": \"Wash Park\"}\n```";

        let event = decode_event(content, DecodePolicy::Strict).unwrap();

        assert_eq!(event.name, "Picnic");
        assert_eq!(event.location, "Wash Park");
    }

    #[test]
    fn test_tolerates_single_line_code_fences() {
        for content in ["```{\"name\":\"Picnic\"}```", "```json {\"name\":\"Picnic\"}```", "``` {\"name\":\"Picnic\"} ```"] {
            let event = decode_event(content, DecodePolicy::Strict).unwrap();

            assert_eq!(event.name, "Picnic", "{content:?}");
        }
    }

    #[test]
    fn test_tolerates_surrounding_prose() {
        let content = "Here is the event:\n{\"name\": \"Picnic\", \"url\": \"https://p.ic\"}\nLet me know!";

        let event = decode_event(content, DecodePolicy::Strict).unwrap();

        assert_eq!(event.name, "Picnic");
        assert_eq!(event.url, "https://p.ic");
    }

    #[test]
    fn test_policy_from_flag() {
        assert_eq!(DecodePolicy::from_strict(true), DecodePolicy::Strict);
        assert_eq!(DecodePolicy::from_strict(false), DecodePolicy::Lenient);
    }
}
