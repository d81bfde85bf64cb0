//! Read-only role capabilities consulted by surrounding surfaces.
//!
//! The core never enforces authorization; these only answer "may this role
//! see/do X" for the host application.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    PracticeLead,
    Auditor,
    Delivery,
    Leadership,
}

impl UserRole {
    pub const fn label(self) -> &'static str {
        match self {
            Self::PracticeLead => "Practice Lead",
            Self::Auditor => "Auditor",
            Self::Delivery => "Delivery",
            Self::Leadership => "Leadership",
        }
    }

    pub const fn can_create_audit(self) -> bool {
        matches!(self, Self::PracticeLead)
    }

    pub const fn can_finalize_audit(self) -> bool {
        matches!(self, Self::PracticeLead)
    }

    pub const fn can_conduct_audit(self) -> bool {
        matches!(self, Self::Auditor)
    }

    pub const fn can_create_actions(self) -> bool {
        matches!(self, Self::PracticeLead)
    }

    pub const fn can_view_preparation(self) -> bool {
        matches!(self, Self::Delivery | Self::Auditor | Self::PracticeLead)
    }

    pub const fn is_view_only(self) -> bool {
        matches!(self, Self::Leadership)
    }
}
