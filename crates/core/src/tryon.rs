//! Virtual try-on: prompt template and interpretation of provider responses.

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use crate::frames::{parse_event_frames, EventFrame, SkippedLine};
use crate::locator::{
    first_candidate, indicates_content_violation, locate_image_url, CONTENT_VIOLATION_SUGGESTION,
};

/// Aspect ratio requested from the image provider.
pub const ASPECT_RATIO: &str = "auto";
/// Output size requested from the image provider.
pub const IMAGE_SIZE: &str = "1K";
/// MIME type used for the data URL when the upload does not declare one.
pub const DEFAULT_IMAGE_MIME: &str = "image/png";

/// Build the image-generation prompt for an outfit description.
pub fn tryon_prompt(outfit: &str) -> String {
    format!(
        "A person wearing {}, fashion photography, high quality, realistic",
        outfit.trim()
    )
}

// ---------------------------------------------------------------------------
// Response interpretation
// ---------------------------------------------------------------------------

/// Body returned by the image provider.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderBody {
    /// Raw text, expected to contain `data:` frames.
    Text(String),
    /// A JSON document returned directly, bypassing the event-stream framing.
    Structured(Value),
}

impl ProviderBody {
    /// The body as a JSON value, for diagnostics.
    pub fn to_value(&self) -> Value {
        match self {
            ProviderBody::Text(text) => Value::String(text.clone()),
            ProviderBody::Structured(value) => value.clone(),
        }
    }
}

/// One entry of the progress log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl ProgressUpdate {
    /// Progress entry for a frame, if it carries a numeric `progress` or a
    /// non-empty `status`.
    pub fn from_frame(frame: &EventFrame) -> Option<Self> {
        let progress = match frame.data.get("progress") {
            Some(Value::Number(n)) => Some(n.clone()),
            _ => None,
        };
        let status = frame
            .data
            .get("status")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        (progress.is_some() || status.is_some()).then_some(Self { progress, status })
    }
}

/// Successful try-on result returned to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TryOnResult {
    pub image_url: String,
    #[serde(default)]
    pub progress_updates: Vec<ProgressUpdate>,
}

/// Failures while interpreting a provider response.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TryOnError {
    /// No final-result object could be recovered from the body.
    #[error("could not parse provider response")]
    UnparseableResponse { raw: Value },

    /// The final result had no usable image locator.
    #[error("no image URL in provider response")]
    NoImageUrl {
        final_result: Value,
        /// The highest-priority candidate that was present but unusable.
        extracted: Option<Value>,
        content_violation: bool,
    },
}

impl TryOnError {
    /// Remediation text for content-violation failures.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            TryOnError::NoImageUrl {
                content_violation: true,
                ..
            } => Some(CONTENT_VIOLATION_SUGGESTION),
            _ => None,
        }
    }
}

/// Outcome of [`interpret_response`], with the skipped frame lines kept so
/// the caller can log them.
#[derive(Debug, Clone)]
pub struct Interpretation {
    pub result: Result<TryOnResult, TryOnError>,
    pub skipped: Vec<SkippedLine>,
    /// Label of the locator rule that produced the URL.
    pub matched_rule: Option<&'static str>,
}

/// Turn a provider body into a [`TryOnResult`].
///
/// Text bodies are frame-parsed: the last parseable frame is the final
/// result and every frame with progress or status feeds the progress log.
/// A structured body is the final result itself with an empty progress log.
pub fn interpret_response(body: &ProviderBody) -> Interpretation {
    let (final_result, progress_updates, skipped) = match body {
        ProviderBody::Text(text) => {
            let parsed = parse_event_frames(text);
            let progress: Vec<ProgressUpdate> = parsed
                .frames
                .iter()
                .filter_map(ProgressUpdate::from_frame)
                .collect();
            let last = parsed
                .final_frame()
                .map(|frame| Value::Object(frame.data.clone()));
            (last, progress, parsed.skipped)
        }
        ProviderBody::Structured(value) if value.is_object() => {
            (Some(value.clone()), Vec::new(), Vec::new())
        }
        ProviderBody::Structured(_) => (None, Vec::new(), Vec::new()),
    };

    let Some(final_result) = final_result else {
        return Interpretation {
            result: Err(TryOnError::UnparseableResponse { raw: body.to_value() }),
            skipped,
            matched_rule: None,
        };
    };

    match locate_image_url(&final_result) {
        Some(located) => Interpretation {
            result: Ok(TryOnResult {
                image_url: located.url,
                progress_updates,
            }),
            skipped,
            matched_rule: Some(located.rule),
        },
        None => {
            let content_violation = indicates_content_violation(&final_result);
            let extracted = first_candidate(&final_result).cloned();
            Interpretation {
                result: Err(TryOnError::NoImageUrl {
                    final_result,
                    extracted,
                    content_violation,
                }),
                skipped,
                matched_rule: None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn text(body: &str) -> ProviderBody {
        ProviderBody::Text(body.to_string())
    }

    #[test]
    fn prompt_interpolates_outfit() {
        assert_eq!(
            tryon_prompt(" black suit "),
            "A person wearing black suit, fashion photography, high quality, realistic"
        );
    }

    #[test]
    fn progress_log_and_final_result_from_frames() {
        let body = "data: {\"progress\":40}\ndata: {\"progress\":90}\ndata: {\"results\":[{\"url\":\"https://x/y.png\"}],\"status\":\"succeeded\"}";
        let interpretation = interpret_response(&text(body));

        let result = interpretation.result.unwrap();
        assert_eq!(result.image_url, "https://x/y.png");
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({
                "imageUrl": "https://x/y.png",
                "progressUpdates": [{"progress": 40}, {"progress": 90}, {"status": "succeeded"}]
            })
        );
        assert_eq!(interpretation.matched_rule, Some("results[0].url"));
    }

    #[test]
    fn frame_with_both_fields_records_both() {
        let body = "data: {\"progress\":100,\"status\":\"succeeded\",\"url\":\"https://u\"}";
        let result = interpret_response(&text(body)).result.unwrap();
        assert_eq!(
            serde_json::to_value(&result.progress_updates).unwrap(),
            json!([{"progress": 100, "status": "succeeded"}])
        );
    }

    #[test]
    fn final_selection_is_positional() {
        // The earlier frame has a URL, but the last frame is authoritative.
        let body = "data: {\"results\":[{\"url\":\"https://early\"}]}\ndata: {\"status\":\"running\"}";
        let interpretation = interpret_response(&text(body));
        assert_matches!(
            interpretation.result,
            Err(TryOnError::NoImageUrl { content_violation: false, .. })
        );
    }

    #[test]
    fn unparseable_lines_are_reported_but_do_not_abort() {
        let body = "data: {oops\ndata: {\"imageUrl\":\"https://ok\"}";
        let interpretation = interpret_response(&text(body));
        assert_eq!(interpretation.skipped.len(), 1);
        assert_eq!(interpretation.result.unwrap().image_url, "https://ok");
    }

    #[test]
    fn structured_body_is_final_result_with_empty_log() {
        let body = ProviderBody::Structured(json!({"imageUrl": "https://direct", "progress": 100}));
        let result = interpret_response(&body).result.unwrap();
        assert_eq!(result.image_url, "https://direct");
        assert!(result.progress_updates.is_empty());
    }

    #[test]
    fn empty_or_frameless_body_is_unparseable() {
        assert_matches!(
            interpret_response(&text("")).result,
            Err(TryOnError::UnparseableResponse { raw }) if raw == json!("")
        );
        assert_matches!(
            interpret_response(&text("<html>gateway error</html>")).result,
            Err(TryOnError::UnparseableResponse { .. })
        );
        assert_matches!(
            interpret_response(&ProviderBody::Structured(json!([1, 2]))).result,
            Err(TryOnError::UnparseableResponse { .. })
        );
    }

    #[test]
    fn failed_status_without_locator_is_content_violation() {
        let err = interpret_response(&text("data: {\"status\":\"failed\"}"))
            .result
            .unwrap_err();
        assert_matches!(&err, TryOnError::NoImageUrl { content_violation: true, .. });
        assert_eq!(err.suggestion(), Some(CONTENT_VIOLATION_SUGGESTION));
    }

    #[test]
    fn blank_url_is_a_failure_not_a_success() {
        let err = interpret_response(&text("data: {\"imageUrl\":\"  \"}"))
            .result
            .unwrap_err();
        assert_matches!(
            err,
            TryOnError::NoImageUrl { content_violation: false, extracted: Some(ref v), .. } if v == "  "
        );
    }
}
