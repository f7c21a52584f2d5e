//! Result-locator extraction and content-violation diagnosis.
//!
//! Providers disagree on where the generated image URL lives. The candidate
//! fields are an ordered list of accessor rules; the first rule resolving to
//! a non-blank string wins.

use serde_json::Value;

/// One step of an accessor path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathStep {
    Key(&'static str),
    Index(usize),
}

/// A named accessor into the final-result object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocatorRule {
    /// Human-readable form, reported back when extraction fails.
    pub label: &'static str,
    pub path: &'static [PathStep],
}

impl LocatorRule {
    /// Follow the path; `None` if any step is missing.
    pub fn resolve<'a>(&self, value: &'a Value) -> Option<&'a Value> {
        self.path.iter().try_fold(value, |current, step| match *step {
            PathStep::Key(key) => current.get(key),
            PathStep::Index(index) => current.get(index),
        })
    }
}

use PathStep::{Index, Key};

/// Candidate locations, highest priority first.
pub const LOCATOR_RULES: &[LocatorRule] = &[
    LocatorRule {
        label: "results[0].url",
        path: &[Key("results"), Index(0), Key("url")],
    },
    LocatorRule {
        label: "imageUrl",
        path: &[Key("imageUrl")],
    },
    LocatorRule {
        label: "output",
        path: &[Key("output")],
    },
    LocatorRule {
        label: "result",
        path: &[Key("result")],
    },
    LocatorRule {
        label: "image",
        path: &[Key("image")],
    },
    LocatorRule {
        label: "url",
        path: &[Key("url")],
    },
];

/// An image URL found in a final-result object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedUrl {
    /// Trimmed, never empty.
    pub url: String,
    /// Label of the rule that matched.
    pub rule: &'static str,
}

/// Evaluate [`LOCATOR_RULES`] in order and return the first non-blank string.
///
/// Non-string candidates and strings that are blank after trimming are
/// treated as absent and the search continues with the next rule.
pub fn locate_image_url(final_result: &Value) -> Option<LocatedUrl> {
    LOCATOR_RULES.iter().find_map(|rule| match rule.resolve(final_result) {
        Some(Value::String(candidate)) => {
            let trimmed = candidate.trim();
            (!trimmed.is_empty()).then(|| LocatedUrl {
                url: trimmed.to_string(),
                rule: rule.label,
            })
        }
        _ => None,
    })
}

/// The first candidate present in `final_result`, whether or not it is
/// usable. Reported back when extraction fails.
pub fn first_candidate(final_result: &Value) -> Option<&Value> {
    LOCATOR_RULES
        .iter()
        .find_map(|rule| rule.resolve(final_result).filter(|v| !v.is_null()))
}

/// Label of the preferred locator.
pub fn primary_format() -> &'static str {
    LOCATOR_RULES[0].label
}

/// Labels of the fallback locators, in priority order.
pub fn alternative_formats() -> Vec<&'static str> {
    LOCATOR_RULES[1..].iter().map(|r| r.label).collect()
}

// ---------------------------------------------------------------------------
// Content-violation heuristic
// ---------------------------------------------------------------------------

/// Free-text field of the final result and the substrings that flag it.
#[derive(Debug, Clone, Copy)]
pub struct ViolationRule {
    pub field: &'static str,
    pub needles: &'static [&'static str],
}

/// Case-sensitive substring vocabulary. This is a heuristic and may both
/// over- and under-classify.
pub const CONTENT_VIOLATION_RULES: &[ViolationRule] = &[
    ViolationRule {
        field: "status",
        needles: &["failed"],
    },
    ViolationRule {
        field: "error",
        needles: &["content"],
    },
    ViolationRule {
        field: "message",
        needles: &["违规", "content", "policy"],
    },
];

/// Remediation text attached to content-violation failures.
pub const CONTENT_VIOLATION_SUGGESTION: &str =
    "生成失败可能是因为内容违规或不符合服务条款，请修改描述重试";

/// Whether the final result looks like a policy/content rejection.
pub fn indicates_content_violation(final_result: &Value) -> bool {
    CONTENT_VIOLATION_RULES.iter().any(|rule| {
        final_result
            .get(rule.field)
            .and_then(Value::as_str)
            .is_some_and(|text| rule.needles.iter().any(|needle| text.contains(needle)))
    })
}
