//! Wardrobe catalog helpers.
//!
//! The advice endpoints take the wardrobe as one free-text string. These
//! helpers select the relevant items and render them in the formats the
//! prompts were written for.

use serde::{Deserialize, Serialize};
use wardrobe_core::advice::Season;

/// Separator between rendered items.
pub const ITEM_SEPARATOR: &str = "; ";

/// One garment in the user's catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WardrobeItem {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub material: String,
    pub season: Season,
    #[serde(default)]
    pub description: String,
}

impl WardrobeItem {
    /// Whether the item is wearable in `season`.
    ///
    /// All-season items match every season, and the all-season filter
    /// matches every item.
    pub fn matches_season(&self, season: Season) -> bool {
        season == Season::AllSeason || self.season == season || self.season == Season::AllSeason
    }

    /// `名称(颜色、材质、季节)—描述`, used for outfit requests.
    pub fn outfit_line(&self) -> String {
        format!(
            "{}({}、{}、{})—{}",
            self.name,
            self.color,
            self.material,
            self.season.label(),
            self.description
        )
    }

    /// `名称(颜色：…、材质：…、季节：…)`, used for purchase requests.
    pub fn purchase_line(&self) -> String {
        format!(
            "{}(颜色：{}、材质：{}、季节：{})",
            self.name,
            self.color,
            self.material,
            self.season.label()
        )
    }
}

/// Items wearable in `season`, in catalog order.
pub fn filter_by_season(items: &[WardrobeItem], season: Season) -> Vec<&WardrobeItem> {
    items.iter().filter(|item| item.matches_season(season)).collect()
}

/// Wardrobe text for an outfit request.
pub fn outfit_description<'a>(items: impl IntoIterator<Item = &'a WardrobeItem>) -> String {
    join_lines(items, WardrobeItem::outfit_line)
}

/// Wardrobe text for a purchase request.
pub fn purchase_description<'a>(items: impl IntoIterator<Item = &'a WardrobeItem>) -> String {
    join_lines(items, WardrobeItem::purchase_line)
}

fn join_lines<'a>(
    items: impl IntoIterator<Item = &'a WardrobeItem>,
    render: fn(&WardrobeItem) -> String,
) -> String {
    items
        .into_iter()
        .map(render)
        .collect::<Vec<_>>()
        .join(ITEM_SEPARATOR)
}

/// Catalog browsing filter. Empty criteria match everything.
#[derive(Debug, Clone, Default)]
pub struct WardrobeFilter {
    pub category: Option<String>,
    /// Case-insensitive substring of the color.
    pub color: Option<String>,
    /// Exact season, unlike [`WardrobeItem::matches_season`].
    pub season: Option<Season>,
    /// Case-insensitive substring of name, color or description.
    pub query: Option<String>,
}

impl WardrobeFilter {
    pub fn matches(&self, item: &WardrobeItem) -> bool {
        let contains = |haystack: &str, needle: &str| {
            haystack.to_lowercase().contains(&needle.to_lowercase())
        };

        let category = self
            .category
            .as_deref()
            .filter(|c| !c.is_empty())
            .map_or(true, |c| item.category == c);
        let color = self
            .color
            .as_deref()
            .filter(|c| !c.is_empty())
            .map_or(true, |c| contains(&item.color, c));
        let season = self.season.map_or(true, |s| item.season == s);
        let query = self.query.as_deref().filter(|q| !q.is_empty()).map_or(true, |q| {
            contains(&item.name, q) || contains(&item.color, q) || contains(&item.description, q)
        });

        category && color && season && query
    }

    pub fn apply<'a>(&self, items: &'a [WardrobeItem]) -> Vec<&'a WardrobeItem> {
        items.iter().filter(|item| self.matches(item)).collect()
    }
}
