//! Mapping between legacy category strings and category UUIDs.
//!
//! Older prompts store their category as a free-text identifier such as
//! `development`; newer ones store the category UUID. Reads resolve both
//! forms to a UUID, writes persist the legacy string whenever one exists.
//! Lookups never fail: anything unresolvable becomes [`FALLBACK_CATEGORY_ID`].

use db::models::category::Category;
use tracing::{debug, warn};
use uuid::Uuid;

/// Id of the `기본 프롬프트` default category.
pub const FALLBACK_CATEGORY_ID: Uuid = Uuid::from_u128(0x91a38be2_3dca_4c28_a7c7_bce2ed9d54d2);

const LEGACY_TO_LABEL: [(&str, &str); 5] = [
    ("development", "기본 프롬프트"),
    ("marketing", "보도자료"),
    ("analysis", "이슈분석"),
    ("creative", "질의서작성"),
    ("business", "시각화"),
];

// Current labels first, then labels used by earlier releases.
const LABEL_TO_LEGACY: [(&str, &str); 11] = [
    ("기본 프롬프트", "development"),
    ("보도자료", "marketing"),
    ("이슈분석", "analysis"),
    ("질의서작성", "creative"),
    ("시각화", "business"),
    ("개발", "development"),
    ("프롬프트 기본", "development"),
    ("마케팅", "marketing"),
    ("분석", "analysis"),
    ("창작", "creative"),
    ("아이데이션", "creative"),
];

/// True for the hyphenated `8-4-4-4-12` hex form, in either case.
pub fn is_uuid_shaped(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() == 36
        && bytes.iter().enumerate().all(|(i, b)| match i {
            8 | 13 | 18 | 23 => *b == b'-',
            _ => b.is_ascii_hexdigit(),
        })
}

pub fn label_for_legacy(legacy: &str) -> Option<&'static str> {
    LEGACY_TO_LABEL
        .iter()
        .find(|(key, _)| *key == legacy)
        .map(|(_, label)| *label)
}

pub fn legacy_for_label(label: &str) -> Option<&'static str> {
    LABEL_TO_LEGACY
        .iter()
        .find(|(key, _)| *key == label)
        .map(|(_, legacy)| *legacy)
}

/// Reconciles category identifiers against one snapshot of the directory.
#[derive(Debug, Clone, Copy)]
pub struct CategoryReconciler<'a> {
    categories: &'a [Category],
}

impl<'a> CategoryReconciler<'a> {
    pub fn new(categories: &'a [Category]) -> Self {
        Self { categories }
    }

    fn find_by_id(&self, id: Uuid) -> Option<&'a Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    /// Resolves a legacy string or UUID to the id of an existing category.
    pub fn to_uuid(&self, legacy_or_uuid: &str) -> Uuid {
        if is_uuid_shaped(legacy_or_uuid) {
            return match Uuid::parse_str(legacy_or_uuid)
                .ok()
                .and_then(|id| self.find_by_id(id))
            {
                Some(category) => category.id,
                None => {
                    warn!(category = legacy_or_uuid, "Unknown category id, using fallback");
                    FALLBACK_CATEGORY_ID
                }
            };
        }

        let Some(label) = label_for_legacy(legacy_or_uuid) else {
            warn!(category = legacy_or_uuid, "Unknown legacy category, using fallback");
            return FALLBACK_CATEGORY_ID;
        };

        match self.categories.iter().find(|c| c.label == label) {
            Some(category) => {
                debug!(legacy = legacy_or_uuid, category_id = %category.id, label, "Resolved legacy category");
                category.id
            }
            None => {
                warn!(legacy = legacy_or_uuid, label, "No category carries the legacy label, using fallback");
                FALLBACK_CATEGORY_ID
            }
        }
    }

    /// Maps a category UUID back to its legacy string. Anything without a
    /// legacy counterpart, including unknown ids, passes through unchanged.
    /// This is the form persisted on every write.
    pub fn to_legacy(&self, category: &str) -> String {
        if !is_uuid_shaped(category) {
            return category.to_string();
        }

        let Some(found) = Uuid::parse_str(category)
            .ok()
            .and_then(|id| self.find_by_id(id))
        else {
            warn!(category, "Category id not in directory, keeping it as-is");
            return category.to_string();
        };

        match legacy_for_label(&found.label) {
            Some(legacy) => legacy.to_string(),
            None => {
                debug!(category_id = %found.id, label = %found.label, "No legacy mapping, storing the id");
                found.id.to_string()
            }
        }
    }
}
