//! Statistics and report types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Admin dashboard aggregates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub users: UserCounts,
    pub events: EventCounts,
    pub registrations: RegistrationCounts,
    pub popular_events: Vec<PopularEvent>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCounts {
    pub total: i64,
    pub students: i64,
    pub admins: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventCounts {
    pub total: i64,
    pub upcoming: i64,
    pub finished: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationCounts {
    pub total: i64,
    pub last_7_days: i64,
    /// Most recent day first.
    pub daily: Vec<DailyCount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCount {
    /// `YYYY-MM-DD` (UTC).
    pub date: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopularEvent {
    pub id: i64,
    pub title: String,
    pub registrations: i64,
}

/// Statistics about the requesting user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MyStats {
    pub total_registrations: i64,
    pub upcoming_events: i64,
    pub attended_events: i64,
    pub recent_registrations: Vec<RecentRegistration>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentRegistration {
    pub event_id: i64,
    pub event_title: String,
    pub registered_at: i64,
}

/// Per-event statistics (admin only).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventStats {
    pub event_id: i64,
    pub title: String,
    pub total_registrations: i64,
    pub capacity: i32,
    /// Percentage of capacity taken, rounded to one decimal.
    pub fill_rate: f64,
    pub group_distribution: BTreeMap<String, i64>,
    /// Registrations per day, keyed by `YYYY-MM-DD`.
    pub registration_timeline: BTreeMap<String, i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub rank: i64,
    pub user_id: i64,
    pub name: String,
    pub group: Option<String>,
    pub events_attended: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leaderboard {
    pub leaderboard: Vec<LeaderboardEntry>,
}

/// System report over the last 30 days (admin only).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemReport {
    /// Unix timestamp the report was generated at.
    pub report_date: i64,
    pub period: String,
    pub users: ReportUsers,
    pub events: ReportEvents,
    pub registrations: ReportRegistrations,
    pub insights: ReportInsights,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportUsers {
    pub total: i64,
    pub new_this_month: i64,
    pub growth_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportEvents {
    pub total: i64,
    pub upcoming: i64,
    pub average_registrations: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRegistrations {
    pub total: i64,
    pub this_month: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportInsights {
    pub most_active_group: Option<String>,
    pub most_active_group_registrations: i64,
}
