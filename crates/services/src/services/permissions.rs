use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use ts_rs::TS;

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display, Default,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum UserRole {
    Admin,
    #[default]
    Viewer,
}

/// A single gated action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Capability {
    Create,
    Update,
    Delete,
    ToggleFavorite,
    ViewAll,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, TS)]
pub struct UserPermissions {
    pub can_create: bool,
    pub can_update: bool,
    pub can_delete: bool,
    pub can_toggle_favorite: bool,
    pub can_view_all: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct RoleDisplay {
    pub label: String,
    pub icon: String,
    pub description: String,
}

impl UserRole {
    pub fn permissions(self) -> UserPermissions {
        match self {
            UserRole::Admin => UserPermissions {
                can_create: true,
                can_update: true,
                can_delete: true,
                can_toggle_favorite: true,
                can_view_all: true,
            },
            UserRole::Viewer => UserPermissions {
                can_create: false,
                can_update: false,
                can_delete: false,
                can_toggle_favorite: false,
                can_view_all: true,
            },
        }
    }

    pub fn display(self) -> RoleDisplay {
        let (label, icon, description) = match self {
            UserRole::Admin => (
                "관리자 모드",
                "👑",
                "모든 프롬프트를 추가, 수정, 삭제할 수 있습니다.",
            ),
            UserRole::Viewer => ("읽기 전용", "👁️", "프롬프트를 조회하고 복사할 수 있습니다."),
        };
        RoleDisplay {
            label: label.to_string(),
            icon: icon.to_string(),
            description: description.to_string(),
        }
    }
}

impl UserPermissions {
    pub fn allows(&self, capability: Capability) -> bool {
        match capability {
            Capability::Create => self.can_create,
            Capability::Update => self.can_update,
            Capability::Delete => self.can_delete,
            Capability::ToggleFavorite => self.can_toggle_favorite,
            Capability::ViewAll => self.can_view_all,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MUTATIONS: [Capability; 4] = [
        Capability::Create,
        Capability::Update,
        Capability::Delete,
        Capability::ToggleFavorite,
    ];

    #[test]
    fn viewer_is_read_only() {
        let permissions = UserRole::Viewer.permissions();
        for capability in MUTATIONS {
            assert!(!permissions.allows(capability), "viewer may {capability}");
        }
        assert!(permissions.allows(Capability::ViewAll));
    }

    #[test]
    fn admin_can_do_everything() {
        let permissions = UserRole::Admin.permissions();
        for capability in MUTATIONS {
            assert!(permissions.allows(capability));
        }
        assert!(permissions.allows(Capability::ViewAll));
    }

    #[test]
    fn default_role_is_viewer() {
        assert_eq!(UserRole::default(), UserRole::Viewer);
        assert_eq!("admin".parse::<UserRole>().unwrap(), UserRole::Admin);
        assert!("root".parse::<UserRole>().is_err());
    }
}
