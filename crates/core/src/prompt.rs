//! Prompt composition for the advice relays.
//!
//! Prompts are fixed instructional text with the request fields inserted
//! into labeled lines. A labeled line for an optional field is emitted only
//! when that field was supplied and is not blank.

use crate::advice::{AdviceKind, AdviceRequest};

/// Sampling temperature sent with every advice request.
pub const ADVICE_TEMPERATURE: f32 = 0.8;
/// Output-length ceiling (tokens) for every advice request.
pub const ADVICE_MAX_TOKENS: u32 = 1500;

// ---------------------------------------------------------------------------
// Template data
// ---------------------------------------------------------------------------

const OUTFIT_SYSTEM: &str =
    "你是一位专业且热情的时尚穿搭顾问，擅长根据用户的服装和风格偏好提供个性化的穿搭建议。";
const PURCHASE_SYSTEM: &str =
    "你是一位专业的时尚购物顾问，擅长根据用户的风格偏好和需求提供个性化的购买建议。";

const OUTFIT_INTRO: &str = "你是一位专业的时尚穿搭顾问。请根据以下信息提供详细的穿搭方案：";
const PURCHASE_INTRO: &str = "你是一位专业的时尚购物顾问。请根据以下信息提供详细的购买建议：";

pub const LABEL_STYLE: &str = "穿搭风格";
pub const LABEL_FAVOURITE_STYLE: &str = "喜爱的穿搭风格";
pub const LABEL_PLANNED: &str = "计划购买的衣物";
pub const LABEL_WARDROBE: &str = "现有衣柜";
pub const LABEL_SEASON: &str = "季节";
pub const LABEL_TEMPERATURE: &str = "气温";
pub const LABEL_OCCASION: &str = "穿搭场合";
pub const LABEL_BUDGET: &str = "预算范围";

const PURCHASE_WARDROBE_REMINDER: &str = "重要：请确保新购买的衣服能更好地与现有衣服搭配。";

const OUTFIT_REQUESTS: &[&str] = &[
    "1. 3-5套具体的穿搭组合建议",
    "2. 每套搭配的详细说明和穿搭要点",
    "3. 适合的场合和季节",
    "4. 针对当前气温的建议（如有季节/气温信息）",
    "5. 配饰建议（如有必要）",
];

const OUTFIT_CLOSING: &str = "请用友好、专业的语气给出建议，格式清晰易读。";
const PURCHASE_CLOSING: &str = "请用友好、专业的语气给出建议，帮助用户做出明智的购买决策。";

// ---------------------------------------------------------------------------
// Composition
// ---------------------------------------------------------------------------

/// A composed prompt: the fixed system instruction plus the user message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvicePrompt {
    pub system: &'static str,
    pub user: String,
}

impl AdvicePrompt {
    /// Compose the prompt for `kind` from an already-validated request.
    pub fn compose(kind: AdviceKind, request: &AdviceRequest) -> Self {
        match kind {
            AdviceKind::Outfit => Self {
                system: OUTFIT_SYSTEM,
                user: outfit_prompt(request),
            },
            AdviceKind::Purchase => Self {
                system: PURCHASE_SYSTEM,
                user: purchase_prompt(request),
            },
        }
    }
}

fn labeled(label: &str, value: &str) -> String {
    format!("{label}：{value}")
}

fn push_optional(lines: &mut Vec<String>, label: &str, value: Option<&str>) {
    if let Some(value) = value {
        lines.push(labeled(label, value));
    }
}

fn outfit_prompt(request: &AdviceRequest) -> String {
    let mut lines = vec![
        OUTFIT_INTRO.to_string(),
        String::new(),
        labeled(LABEL_STYLE, request.style()),
    ];
    push_optional(&mut lines, LABEL_WARDROBE, request.wardrobe());
    push_optional(&mut lines, LABEL_SEASON, request.season.map(|s| s.label()));
    push_optional(&mut lines, LABEL_TEMPERATURE, request.temperature());
    push_optional(&mut lines, LABEL_OCCASION, request.occasion());

    lines.push(String::new());
    lines.push("请提供：".to_string());
    lines.extend(OUTFIT_REQUESTS.iter().map(|s| s.to_string()));
    lines.push(String::new());
    lines.push(OUTFIT_CLOSING.to_string());
    lines.join("\n")
}

fn purchase_prompt(request: &AdviceRequest) -> String {
    let wardrobe = request.wardrobe();
    let mut lines = vec![
        PURCHASE_INTRO.to_string(),
        String::new(),
        labeled(LABEL_FAVOURITE_STYLE, request.style()),
        labeled(LABEL_PLANNED, request.planned().unwrap_or_default()),
    ];
    if let Some(items) = wardrobe {
        lines.push(labeled(LABEL_WARDROBE, items));
        lines.push(PURCHASE_WARDROBE_REMINDER.to_string());
    }
    push_optional(&mut lines, LABEL_SEASON, request.season.map(|s| s.label()));
    push_optional(&mut lines, LABEL_TEMPERATURE, request.temperature());
    push_optional(&mut lines, LABEL_BUDGET, request.budget());

    let wardrobe_hint = if wardrobe.is_some() { "（考虑现有衣物）" } else { "" };
    lines.push(String::new());
    lines.push("请提供：".to_string());
    lines.push("1. 具体的单品推荐（包括款式、颜色、材质等）".to_string());
    lines.push("2. 购买优先级排序".to_string());
    lines.push(format!("3. 与现有衣柜的搭配建议和实用性分析{wardrobe_hint}"));
    lines.push("4. 根据季节气温的面料/款式建议（如有季节/气温信息）".to_string());
    lines.push("5. 预算分配建议（如有预算限制）".to_string());
    lines.push("6. 品牌或购买渠道建议（可选）".to_string());
    lines.push(String::new());
    lines.push(PURCHASE_CLOSING.to_string());
    lines.join("\n")
}
