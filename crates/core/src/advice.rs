//! Advice request types and validation.
//!
//! One [`AdviceRequest`] shape serves both advice relays; [`AdviceKind`]
//! selects which fields are mandatory and which prompt template applies.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Season
// ---------------------------------------------------------------------------

/// Season the advice should be tailored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Season {
    Spring,
    Summer,
    Autumn,
    Winter,
    AllSeason,
}

impl Season {
    pub const ALL: [Season; 5] = [
        Season::Spring,
        Season::Summer,
        Season::Autumn,
        Season::Winter,
        Season::AllSeason,
    ];

    /// Wire value (`spring`, ..., `all-season`).
    pub fn as_str(self) -> &'static str {
        match self {
            Season::Spring => "spring",
            Season::Summer => "summer",
            Season::Autumn => "autumn",
            Season::Winter => "winter",
            Season::AllSeason => "all-season",
        }
    }

    /// Label used inside prompts and by the browser catalog.
    pub fn label(self) -> &'static str {
        match self {
            Season::Spring => "春",
            Season::Summer => "夏",
            Season::Autumn => "秋",
            Season::Winter => "冬",
            Season::AllSeason => "四季通用",
        }
    }

    /// Parse either the wire value or the catalog label.
    pub fn parse(value: &str) -> Option<Season> {
        let value = value.trim();
        Season::ALL
            .into_iter()
            .find(|s| s.as_str().eq_ignore_ascii_case(value) || s.label() == value)
    }
}

impl Serialize for Season {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Season {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Season::parse(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown season '{raw}'")))
    }
}

/// Blank strings are treated as "no season selected".
fn deserialize_optional_season<'de, D>(deserializer: D) -> Result<Option<Season>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => Season::parse(value)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown season '{value}'"))),
    }
}

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// Which advice relay is handling a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdviceKind {
    /// Outfit combinations from the existing wardrobe.
    Outfit,
    /// Purchase recommendations for planned items.
    Purchase,
}

impl AdviceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AdviceKind::Outfit => "outfit",
            AdviceKind::Purchase => "purchase",
        }
    }

    /// User-facing message returned when the relay fails.
    pub fn failure_message(self) -> &'static str {
        match self {
            AdviceKind::Outfit => "生成穿搭方案失败",
            AdviceKind::Purchase => "生成购买建议失败",
        }
    }
}

/// Body accepted by `/generate-outfit` and `/purchase-advice`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdviceRequest {
    #[serde(default)]
    pub style: String,
    /// Free-text description of the wardrobe, built by the client.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wardrobe_items: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub planned_items: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_optional_season",
        skip_serializing_if = "Option::is_none"
    )]
    pub season: Option<Season>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occasion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<String>,
}

/// Return the trimmed value if the field was supplied and is not blank.
pub fn supplied(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl AdviceRequest {
    pub fn style(&self) -> &str {
        self.style.trim()
    }

    pub fn wardrobe(&self) -> Option<&str> {
        supplied(&self.wardrobe_items)
    }

    pub fn planned(&self) -> Option<&str> {
        supplied(&self.planned_items)
    }

    pub fn temperature(&self) -> Option<&str> {
        supplied(&self.temperature)
    }

    pub fn occasion(&self) -> Option<&str> {
        supplied(&self.occasion)
    }

    pub fn budget(&self) -> Option<&str> {
        supplied(&self.budget)
    }

    /// Check the fields mandatory for `kind`.
    ///
    /// `style` is always required; purchase advice also needs `plannedItems`.
    pub fn validate(&self, kind: AdviceKind) -> Result<(), CoreError> {
        if self.style().is_empty() {
            return Err(CoreError::Validation("style is required".into()));
        }
        if kind == AdviceKind::Purchase && self.planned().is_none() {
            return Err(CoreError::Validation("plannedItems is required".into()));
        }
        Ok(())
    }
}
