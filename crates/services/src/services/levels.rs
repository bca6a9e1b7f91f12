//! The four fixed learning levels and the level view of the prompt library.
//!
//! A prompt's level is read from a leading `[tag]` in its title, e.g.
//! `[중급] 보도자료 초안`. Untagged prompts land in the first level.

use db::models::prompt::Prompt;
use serde::Serialize;
use ts_rs::TS;
use utils::text::bracket_tag;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
pub struct LevelCategory {
    pub id: &'static str,
    pub level: &'static str,
    pub label: &'static str,
    pub description: &'static str,
    pub color: &'static str,
    pub bg_color: &'static str,
    pub border_color: &'static str,
    pub order: u8,
    pub icon: &'static str,
}

pub const LEVEL_CATEGORIES: [LevelCategory; 4] = [
    LevelCategory {
        id: "beginner",
        level: "초급",
        label: "초급",
        description: "프롬프트 작성의 기본기를 익히는 단계",
        color: "text-green-700",
        bg_color: "bg-green-50",
        border_color: "border-green-200",
        order: 1,
        icon: "🌱",
    },
    LevelCategory {
        id: "intermediate",
        level: "중급",
        label: "중급",
        description: "실무에 활용 가능한 프롬프트 작성 기법",
        color: "text-blue-700",
        bg_color: "bg-blue-50",
        border_color: "border-blue-200",
        order: 2,
        icon: "📈",
    },
    LevelCategory {
        id: "advanced",
        level: "고급",
        label: "고급",
        description: "복잡한 문제 해결을 위한 고급 프롬프트 기법",
        color: "text-orange-700",
        bg_color: "bg-orange-50",
        border_color: "border-orange-200",
        order: 3,
        icon: "🚀",
    },
    LevelCategory {
        id: "expert",
        level: "심화",
        label: "심화",
        description: "전문가 수준의 고도화된 프롬프트 전략",
        color: "text-purple-700",
        bg_color: "bg-purple-50",
        border_color: "border-purple-200",
        order: 4,
        icon: "💎",
    },
];

#[derive(Debug, Clone, Serialize, TS)]
pub struct LevelGroup {
    pub level: LevelCategory,
    pub prompts: Vec<Prompt>,
}

/// Levels sorted by `order`.
pub fn levels() -> Vec<LevelCategory> {
    let mut levels = LEVEL_CATEGORIES.to_vec();
    levels.sort_by_key(|level| level.order);
    levels
}

/// Looks a level up by its Korean name or its id.
pub fn find(level_or_id: &str) -> Option<LevelCategory> {
    LEVEL_CATEGORIES
        .iter()
        .find(|level| level.level == level_or_id || level.id == level_or_id)
        .copied()
}

pub fn next(level_or_id: &str) -> Option<LevelCategory> {
    let current = find(level_or_id)?;
    LEVEL_CATEGORIES
        .iter()
        .find(|level| level.order == current.order + 1)
        .copied()
}

pub fn previous(level_or_id: &str) -> Option<LevelCategory> {
    let current = find(level_or_id)?;
    LEVEL_CATEGORIES
        .iter()
        .find(|level| current.order > 1 && level.order == current.order - 1)
        .copied()
}

pub fn level_of(title: &str) -> LevelCategory {
    bracket_tag(title)
        .and_then(|tag| {
            LEVEL_CATEGORIES
                .iter()
                .find(|level| level.level == tag || level.label == tag)
        })
        .copied()
        .unwrap_or(LEVEL_CATEGORIES[0])
}

/// Splits prompts into one group per level, keeping their order.
pub fn group(prompts: &[Prompt]) -> Vec<LevelGroup> {
    let mut groups: Vec<LevelGroup> = levels()
        .into_iter()
        .map(|level| LevelGroup {
            level,
            prompts: Vec::new(),
        })
        .collect();

    for prompt in prompts {
        let level = level_of(&prompt.title);
        if let Some(group) = groups.iter_mut().find(|g| g.level.id == level.id) {
            group.prompts.push(prompt.clone());
        }
    }
    groups
}
