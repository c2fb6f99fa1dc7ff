/// Shared types used across the codebase

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Opaque user identifier issued by the identity provider
pub type UserId = String;

/// Error returned when a string does not name a known enum variant
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind}: '{value}' (expected one of {})", .expected.trim_end())]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
    pub expected: &'static str,
}

macro_rules! text_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal {
            $($variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim();
                $name::ALL
                    .iter()
                    .find(|v| v.as_str().eq_ignore_ascii_case(wanted))
                    .copied()
                    .ok_or_else(|| ParseEnumError {
                        kind: $kind,
                        value: s.to_string(),
                        expected: concat!($($text, " "),+),
                    })
            }
        }

        impl TryFrom<String> for $name {
            type Error = ParseEnumError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.as_str().to_string()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

text_enum! {
    /// Ticket severity. Ordering is fixed by `rank`, never by the string form.
    Priority, "priority" {
        Omega => "OMEGA",
        Alpha => "ALPHA",
        Beta => "BETA",
        Gamma => "GAMMA",
    }
}

impl Priority {
    /// Static severity table: OMEGA > ALPHA > BETA > GAMMA
    pub fn rank(&self) -> i32 {
        match self {
            Priority::Omega => 4,
            Priority::Alpha => 3,
            Priority::Beta => 2,
            Priority::Gamma => 1,
        }
    }

    /// Variant names ordered from most to least severe
    pub const SEVERITY_ORDER: &'static [&'static str] = &["OMEGA", "ALPHA", "BETA", "GAMMA"];
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Beta
    }
}

impl PartialOrd for Priority {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Priority {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.rank().cmp(&other.rank())
    }
}

text_enum! {
    TicketStatus, "ticket status" {
        New => "NEW",
        InProgress => "IN_PROGRESS",
        Pending => "PENDING",
        Resolved => "RESOLVED",
    }
}

impl TicketStatus {
    /// Allowed status moves. Staying in the same status is always permitted.
    pub fn can_transition_to(&self, next: TicketStatus) -> bool {
        use TicketStatus::*;
        if *self == next {
            return true;
        }
        matches!(
            (self, next),
            (New, InProgress)
                | (New, Pending)
                | (New, Resolved)
                | (InProgress, Pending)
                | (InProgress, Resolved)
                | (Pending, InProgress)
                | (Pending, Resolved)
                | (Resolved, InProgress)
        )
    }
}

text_enum! {
    TicketType, "ticket type" {
        Mission => "MISSION",
        Equipment => "EQUIPMENT",
        Intelligence => "INTELLIGENCE",
    }
}

text_enum! {
    UserStatus, "user status" {
        Active => "ACTIVE",
        Inactive => "INACTIVE",
        Mia => "MIA",
    }
}

text_enum! {
    /// Dashboard role used for UI gating
    Role, "role" {
        Hero => "HERO",
        Support => "SUPPORT",
        Admin => "ADMIN",
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::Hero
    }
}

text_enum! {
    NotificationType, "notification type" {
        Mention => "MENTION",
    }
}

text_enum! {
    /// Sortable ticket columns
    TicketSort, "sort key" {
        CreatedAt => "CREATED_AT",
        UpdatedAt => "UPDATED_AT",
        Priority => "PRIORITY",
    }
}

impl TicketSort {
    pub fn column(&self) -> &'static str {
        match self {
            TicketSort::CreatedAt => "created_at",
            TicketSort::UpdatedAt => "updated_at",
            TicketSort::Priority => "priority",
        }
    }
}

text_enum! {
    Theme, "theme" {
        Light => "light",
        Dark => "dark",
        System => "system",
        HighContrast => "high_contrast",
    }
}
