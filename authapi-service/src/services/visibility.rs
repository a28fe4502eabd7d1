//! Which entities take part in permission resolution and default listings.
//!
//! Archiving is a soft delete: rows stay, they just stop counting.

use std::str::FromStr;

use service_core::error::AppError;

use crate::models::{Organization, Team, User};

pub fn organization_visible(org: &Organization) -> bool {
    !org.archived
}

/// A team counts only while neither it nor its organization is archived.
pub fn team_visible(team: &Team, org: &Organization) -> bool {
    debug_assert_eq!(team.organization_id, org.id);
    !team.archived && organization_visible(org)
}

pub fn user_visible(user: &User) -> bool {
    user.is_active
}

/// `?archived=` selector for organization listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArchivedFilter {
    True,
    #[default]
    False,
    Both,
}

impl ArchivedFilter {
    /// Missing parameter means live organizations only.
    pub fn parse(value: Option<&str>) -> Result<Self, AppError> {
        match value {
            None => Ok(Self::default()),
            Some(raw) => raw.parse(),
        }
    }

    /// The `archived` column value to match, `None` for both.
    pub fn archived(self) -> Option<bool> {
        match self {
            ArchivedFilter::True => Some(true),
            ArchivedFilter::False => Some(false),
            ArchivedFilter::Both => None,
        }
    }

    pub fn matches(self, org: &Organization) -> bool {
        self.archived().map_or(true, |archived| org.archived == archived)
    }
}

impl FromStr for ArchivedFilter {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "true" => Ok(ArchivedFilter::True),
            "false" => Ok(ArchivedFilter::False),
            "both" => Ok(ArchivedFilter::Both),
            _ => Err(AppError::field(
                "archived",
                "Must be one of [both, false, true]",
            )),
        }
    }
}
