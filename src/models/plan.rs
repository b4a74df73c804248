// SPDX-License-Identifier: MIT

//! Plan model: a proposed group activity with fixed capacity.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Grace window after the scheduled time during which a plan stays
/// visible in the feed.
pub const GRACE_WINDOW_HOURS: i64 = 3;

/// Plan categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanCategory {
    Ride,
    Gym,
    Transit,
    Food,
    Study,
    Movie,
    Other,
}

impl PlanCategory {
    pub fn label(&self) -> &'static str {
        match self {
            PlanCategory::Ride => "Ride",
            PlanCategory::Gym => "Gym",
            PlanCategory::Transit => "Transit",
            PlanCategory::Food => "Food",
            PlanCategory::Study => "Study",
            PlanCategory::Movie => "Movie",
            PlanCategory::Other => "Other",
        }
    }
}

/// Category-specific descriptor payload. Each variant carries only the
/// fields that category needs; rides get origin/destination, food gets
/// a venue, everything else a free-text description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanDetails {
    Ride { origin: String, destination: String },
    Gym { description: String },
    Transit { description: String },
    Food { venue: String },
    Study { description: String },
    Movie { description: String },
    Other { description: String },
}

impl PlanDetails {
    pub fn category(&self) -> PlanCategory {
        match self {
            PlanDetails::Ride { .. } => PlanCategory::Ride,
            PlanDetails::Gym { .. } => PlanCategory::Gym,
            PlanDetails::Transit { .. } => PlanCategory::Transit,
            PlanDetails::Food { .. } => PlanCategory::Food,
            PlanDetails::Study { .. } => PlanCategory::Study,
            PlanDetails::Movie { .. } => PlanCategory::Movie,
            PlanDetails::Other { .. } => PlanCategory::Other,
        }
    }

    /// Human-readable context label, rendered once at notification
    /// write time and stored denormalized.
    pub fn context_label(&self) -> String {
        match self {
            PlanDetails::Ride {
                origin,
                destination,
            } => format!("{} → {}", origin, destination),
            PlanDetails::Food { venue } => format!("Food: {}", venue),
            PlanDetails::Gym { description }
            | PlanDetails::Transit { description }
            | PlanDetails::Study { description }
            | PlanDetails::Movie { description }
            | PlanDetails::Other { description } => {
                format!("{}: {}", self.category().label(), description)
            }
        }
    }
}

/// Derived plan status; a pure function of occupancy, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanStatus {
    Open,
    Full,
}

/// Plan document stored under the `plans` collection.
///
/// The creator is denormalized at creation time and never appears in
/// `participants`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    #[serde(flatten)]
    pub details: PlanDetails,
    /// Member-supplied schedule (RFC3339); `None` means "flexible".
    pub scheduled_time: Option<String>,
    pub created_at: String,
    /// Immutable, set at creation, >= 2.
    pub capacity: u32,
    /// Joined member ids; size never exceeds `capacity`.
    #[serde(default)]
    pub participants: Vec<String>,
    pub creator_id: String,
    pub creator_name: String,
    pub creator_avatar: Option<String>,
    pub creator_payment_handle: Option<String>,
}

impl Plan {
    pub fn status(&self) -> PlanStatus {
        if self.participants.len() < self.capacity as usize {
            PlanStatus::Open
        } else {
            PlanStatus::Full
        }
    }

    pub fn is_full(&self) -> bool {
        self.status() == PlanStatus::Full
    }

    pub fn has_participant(&self, member_id: &str) -> bool {
        self.participants.iter().any(|p| p == member_id)
    }

    /// When the plan drops out of the feed: scheduled time plus the
    /// grace window. Flexible plans never expire.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let scheduled = crate::time_utils::parse_rfc3339(self.scheduled_time.as_deref()?)?;
        Some(scheduled + Duration::hours(GRACE_WINDOW_HOURS))
    }

    /// Read-time visibility filter; enforced by every reader, never
    /// guaranteed by a deletion pass.
    pub fn is_visible(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at() {
            Some(expires_at) => now <= expires_at,
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn ride_plan(scheduled_time: Option<String>, capacity: u32) -> Plan {
        Plan {
            details: PlanDetails::Ride {
                origin: "Campus".into(),
                destination: "Airport".into(),
            },
            scheduled_time,
            created_at: "2026-01-01T10:00:00Z".into(),
            capacity,
            participants: vec![],
            creator_id: "alice".into(),
            creator_name: "Alice".into(),
            creator_avatar: None,
            creator_payment_handle: None,
        }
    }

    #[test]
    fn status_is_derived_from_occupancy() {
        let mut plan = ride_plan(None, 2);
        assert_eq!(plan.status(), PlanStatus::Open);

        plan.participants.push("bob".into());
        assert_eq!(plan.status(), PlanStatus::Open);

        plan.participants.push("carol".into());
        assert_eq!(plan.status(), PlanStatus::Full);
    }

    #[test]
    fn context_labels_are_category_aware() {
        assert_eq!(
            PlanDetails::Ride {
                origin: "Campus".into(),
                destination: "Airport".into()
            }
            .context_label(),
            "Campus → Airport"
        );
        assert_eq!(
            PlanDetails::Food {
                venue: "Mess Hall".into()
            }
            .context_label(),
            "Food: Mess Hall"
        );
        assert_eq!(
            PlanDetails::Study {
                description: "Algorithms finals".into()
            }
            .context_label(),
            "Study: Algorithms finals"
        );
    }

    #[test]
    fn expiry_uses_three_hour_grace_window() {
        let now = chrono::Utc::now();
        let two_hours_ago = crate::time_utils::format_utc_rfc3339(now - Duration::hours(2));
        let four_hours_ago = crate::time_utils::format_utc_rfc3339(now - Duration::hours(4));

        assert!(ride_plan(Some(two_hours_ago), 2).is_visible(now));
        assert!(!ride_plan(Some(four_hours_ago), 2).is_visible(now));
        // Flexible plans never expire.
        assert!(ride_plan(None, 2).is_visible(now));
    }

    #[test]
    fn details_round_trip_is_tagged_by_category() {
        let plan = ride_plan(None, 3);
        let value = serde_json::to_value(&plan).unwrap();
        assert_eq!(value["category"], "RIDE");
        assert_eq!(value["origin"], "Campus");

        let back: Plan = serde_json::from_value(value).unwrap();
        assert_eq!(back.details, plan.details);
    }
}
