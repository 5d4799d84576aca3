//! Dashboard, personal and per-event statistics, and the periodic report.
//!
//! Aggregates over whole tables are SQL-only processors. Per-user and
//! per-event figures are computed from ledger rows so they work with any
//! store.

use std::collections::BTreeMap;

use clubs_sdk::objects::stats::{
    DailyCount, DashboardStats, EventCounts, EventStats, LeaderboardEntry, MyStats,
    PopularEvent, RecentRegistration, RegistrationCounts, ReportEvents, ReportInsights,
    ReportRegistrations, ReportUsers, SystemReport, UserCounts,
};
use itertools::Itertools;
use kanau::processor::Processor;
use time::{Duration, OffsetDateTime};

use crate::entities::events::EventRecord;
use crate::entities::registrations::{Participant, UserRegistration};
use crate::error::StoreError;
use crate::framework::DatabaseProcessor;

/// Days covered by the dashboard's recent-activity figures.
pub const DASHBOARD_DAYS: i64 = 7;
/// Days covered by the system report.
pub const REPORT_DAYS: i64 = 30;
pub const POPULAR_EVENTS_LIMIT: i64 = 5;
pub const LEADERBOARD_LIMIT: i64 = 10;
pub const RECENT_REGISTRATIONS_LIMIT: usize = 5;
/// Bucket for participants without a group.
pub const NO_GROUP: &str = "No Group";

/// Round to one decimal place.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Share of capacity taken, in percent with one decimal.
pub fn fill_rate(registrations: i64, capacity: i32) -> f64 {
    if capacity <= 0 {
        return 0.0;
    }
    round1(registrations as f64 / f64::from(capacity) * 100.0)
}

/// Growth of the user base over a period, in percent with one decimal.
///
/// Compares the new users against the users that existed before the period.
pub fn growth_rate(new_users: i64, total_users: i64) -> f64 {
    let before = (total_users - new_users).max(1);
    round1(new_users as f64 / before as f64 * 100.0)
}

/// Average registrations per event, with one decimal.
pub fn average_registrations(registrations: i64, events: i64) -> f64 {
    if events <= 0 {
        return 0.0;
    }
    round1(registrations as f64 / events as f64)
}

/// Count `times` per UTC day for the `days` days ending at `now`, newest day
/// first. Days without registrations are reported with a zero count.
pub fn daily_counts(times: &[OffsetDateTime], now: OffsetDateTime, days: i64) -> Vec<DailyCount> {
    let per_day = times.iter().map(|t| t.date()).counts();
    (0..days)
        .map(|i| {
            let day = (now - Duration::days(i)).date();
            DailyCount {
                date: day.to_string(),
                count: per_day.get(&day).copied().unwrap_or(0) as i64,
            }
        })
        .collect()
}

/// Start of the UTC day `days - 1` days before `now`.
fn window_start(now: OffsetDateTime, days: i64) -> OffsetDateTime {
    (now - Duration::days(days - 1))
        .date()
        .midnight()
        .assume_utc()
}

/// Personal statistics from a user's registrations (most recent first).
pub fn my_stats(registrations: &[UserRegistration], now: OffsetDateTime) -> MyStats {
    let upcoming = registrations.iter().filter(|r| r.event_date > now).count() as i64;
    MyStats {
        total_registrations: registrations.len() as i64,
        upcoming_events: upcoming,
        attended_events: registrations.len() as i64 - upcoming,
        recent_registrations: registrations
            .iter()
            .sorted_by(|a, b| b.registered_at.cmp(&a.registered_at).then(b.id.cmp(&a.id)))
            .take(RECENT_REGISTRATIONS_LIMIT)
            .map(|r| RecentRegistration {
                event_id: r.event_id,
                event_title: r.event_title.clone(),
                registered_at: r.registered_at.unix_timestamp(),
            })
            .collect(),
    }
}

/// Statistics for one event from its participant list.
pub fn event_stats(event: &EventRecord, participants: &[Participant]) -> EventStats {
    let total = participants.len() as i64;
    let mut group_distribution = BTreeMap::new();
    let mut registration_timeline = BTreeMap::new();
    for participant in participants {
        let group = participant.group.as_deref().unwrap_or(NO_GROUP).to_string();
        *group_distribution.entry(group).or_insert(0) += 1;
        *registration_timeline
            .entry(participant.registered_at.date().to_string())
            .or_insert(0) += 1;
    }
    EventStats {
        event_id: event.id,
        title: event.title.clone(),
        total_registrations: total,
        capacity: event.max_participants,
        fill_rate: fill_rate(total, event.max_participants),
        group_distribution,
        registration_timeline,
    }
}

#[derive(Debug, Clone, Copy)]
/// Whole-system aggregates for the admin dashboard.
pub struct LoadDashboard {
    pub now: OffsetDateTime,
}

impl Processor<LoadDashboard> for DatabaseProcessor {
    type Output = DashboardStats;
    type Error = StoreError;
    #[tracing::instrument(skip_all, err, name = "SQL:LoadDashboard")]
    async fn process(&self, query: LoadDashboard) -> Result<DashboardStats, StoreError> {
        let (users_total, students, admins): (i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*),
                COUNT(*) FILTER (WHERE role = 'student'),
                COUNT(*) FILTER (WHERE role = 'admin')
            FROM users
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        let (events_total, upcoming, finished): (i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*),
                COUNT(*) FILTER (WHERE date > $1),
                COUNT(*) FILTER (WHERE date <= $1)
            FROM events
            "#,
        )
        .bind(query.now)
        .fetch_one(&self.pool)
        .await?;

        let week_ago = query.now - Duration::days(DASHBOARD_DAYS);
        let (registrations_total, last_7_days): (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), COUNT(*) FILTER (WHERE registered_at >= $1) FROM registrations",
        )
        .bind(week_ago)
        .fetch_one(&self.pool)
        .await?;

        let recent: Vec<OffsetDateTime> =
            sqlx::query_scalar("SELECT registered_at FROM registrations WHERE registered_at >= $1")
                .bind(window_start(query.now, DASHBOARD_DAYS))
                .fetch_all(&self.pool)
                .await?;

        let popular: Vec<(i64, String, i64)> = sqlx::query_as(
            r#"
            SELECT e.id, e.title, COUNT(r.id)
            FROM events e
            LEFT JOIN registrations r ON r.event_id = e.id
            GROUP BY e.id
            ORDER BY COUNT(r.id) DESC, e.id ASC
            LIMIT $1
            "#,
        )
        .bind(POPULAR_EVENTS_LIMIT)
        .fetch_all(&self.pool)
        .await?;

        Ok(DashboardStats {
            users: UserCounts {
                total: users_total,
                students,
                admins,
            },
            events: EventCounts {
                total: events_total,
                upcoming,
                finished,
            },
            registrations: RegistrationCounts {
                total: registrations_total,
                last_7_days,
                daily: daily_counts(&recent, query.now, DASHBOARD_DAYS),
            },
            popular_events: popular
                .into_iter()
                .map(|(id, title, registrations)| PopularEvent {
                    id,
                    title,
                    registrations,
                })
                .collect(),
        })
    }
}

#[derive(Debug, Clone, Copy)]
/// Students with the most registrations.
pub struct LoadLeaderboard {
    pub limit: i64,
}

impl Processor<LoadLeaderboard> for DatabaseProcessor {
    type Output = Vec<LeaderboardEntry>;
    type Error = StoreError;
    #[tracing::instrument(skip_all, err, name = "SQL:LoadLeaderboard")]
    async fn process(&self, query: LoadLeaderboard) -> Result<Vec<LeaderboardEntry>, StoreError> {
        let rows: Vec<(i64, String, Option<String>, i64)> = sqlx::query_as(
            r#"
            SELECT u.id, u.full_name, u.group_name, COUNT(r.id)
            FROM users u
            JOIN registrations r ON r.user_id = u.id
            WHERE u.role = 'student'
            GROUP BY u.id
            ORDER BY COUNT(r.id) DESC, u.id ASC
            LIMIT $1
            "#,
        )
        .bind(query.limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rank(rows))
    }
}

/// Number already-sorted leaderboard rows starting at 1.
fn rank(rows: Vec<(i64, String, Option<String>, i64)>) -> Vec<LeaderboardEntry> {
    rows.into_iter()
        .zip(1..)
        .map(|((user_id, name, group, events_attended), rank)| LeaderboardEntry {
            rank,
            user_id,
            name,
            group,
            events_attended,
        })
        .collect()
}

#[derive(Debug, Clone, Copy)]
/// The system report over the last [`REPORT_DAYS`] days.
pub struct LoadReport {
    pub now: OffsetDateTime,
}

impl Processor<LoadReport> for DatabaseProcessor {
    type Output = SystemReport;
    type Error = StoreError;
    #[tracing::instrument(skip_all, err, name = "SQL:LoadReport")]
    async fn process(&self, query: LoadReport) -> Result<SystemReport, StoreError> {
        let since = query.now - Duration::days(REPORT_DAYS);

        let (users_total, new_users): (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), COUNT(*) FILTER (WHERE created_at >= $1) FROM users",
        )
        .bind(since)
        .fetch_one(&self.pool)
        .await?;

        let (events_total, upcoming): (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), COUNT(*) FILTER (WHERE date > $1) FROM events",
        )
        .bind(query.now)
        .fetch_one(&self.pool)
        .await?;

        let (registrations_total, this_month): (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), COUNT(*) FILTER (WHERE registered_at >= $1) FROM registrations",
        )
        .bind(since)
        .fetch_one(&self.pool)
        .await?;

        let top_group: Option<(String, i64)> = sqlx::query_as(
            r#"
            SELECT u.group_name, COUNT(r.id)
            FROM registrations r
            JOIN users u ON u.id = r.user_id
            WHERE u.group_name IS NOT NULL
            GROUP BY u.group_name
            ORDER BY COUNT(r.id) DESC, u.group_name ASC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        let (most_active_group, most_active_group_registrations) = match top_group {
            Some((group, count)) => (Some(group), count),
            None => (None, 0),
        };

        Ok(SystemReport {
            report_date: query.now.unix_timestamp(),
            period: format!("Last {REPORT_DAYS} days"),
            users: ReportUsers {
                total: users_total,
                new_this_month: new_users,
                growth_rate: growth_rate(new_users, users_total),
            },
            events: ReportEvents {
                total: events_total,
                upcoming,
                average_registrations: average_registrations(registrations_total, events_total),
            },
            registrations: ReportRegistrations {
                total: registrations_total,
                this_month,
            },
            insights: ReportInsights {
                most_active_group,
                most_active_group_registrations,
            },
        })
    }
}
