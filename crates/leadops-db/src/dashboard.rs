//! Read-model query behind the results dashboard: processor results joined to
//! their leads, filtered and paginated.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use leadops_core::ValidationError;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

pub const DEFAULT_WINDOW_DAYS: u64 = 14;
pub const DEFAULT_PAGE_SIZE: u32 = 200;
pub const MAX_PAGE_SIZE: u32 = 500;

/// An inclusive range of whole UTC days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateWindow {
    /// The `days`-long window ending on (and including) `today`.
    #[must_use]
    pub fn last_days(today: NaiveDate, days: u64) -> Self {
        let back = days.saturating_sub(1);
        let from = today.checked_sub_days(Days::new(back)).unwrap_or(NaiveDate::MIN);
        Self { from, to: today }
    }

    /// The default dashboard window: the last 14 days ending today (UTC).
    #[must_use]
    pub fn default_for(today: NaiveDate) -> Self {
        Self::last_days(today, DEFAULT_WINDOW_DAYS)
    }

    /// # Errors
    ///
    /// Returns [`ValidationError`] when `from` is after `to`.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.from > self.to {
            return Err(ValidationError::new(format!(
                "date_from {} is after date_to {}",
                self.from, self.to
            )));
        }
        Ok(())
    }

    /// Half-open timestamp bounds `[from 00:00, day after to 00:00)`, which
    /// covers every instant of the last day.
    #[must_use]
    pub fn bounds(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        let start = self.from.and_time(NaiveTime::MIN).and_utc();
        let end = self
            .to
            .succ_opt()
            .map_or(DateTime::<Utc>::MAX_UTC, |d| d.and_time(NaiveTime::MIN).and_utc());
        (start, end)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoreOp {
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Gte,
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "<=")]
    Lte,
    #[serde(rename = "<")]
    Lt,
}

impl ScoreOp {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ScoreOp::Gt => ">",
            ScoreOp::Gte => ">=",
            ScoreOp::Eq => "=",
            ScoreOp::Lte => "<=",
            ScoreOp::Lt => "<",
        }
    }
}

impl fmt::Display for ScoreOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScoreOp {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            ">" => Ok(ScoreOp::Gt),
            ">=" => Ok(ScoreOp::Gte),
            "=" | "==" => Ok(ScoreOp::Eq),
            "<=" => Ok(ScoreOp::Lte),
            "<" => Ok(ScoreOp::Lt),
            other => Err(ValidationError::new(format!(
                "unknown score operator '{other}' (expected >, >=, =, <=, <)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreFilter {
    pub op: ScoreOp,
    pub value: i32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDir {
    Asc,
    #[default]
    Desc,
}

impl SortDir {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            SortDir::Asc => "asc",
            SortDir::Desc => "desc",
        }
    }
}

impl FromStr for SortDir {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(SortDir::Asc),
            "desc" => Ok(SortDir::Desc),
            other => Err(ValidationError::new(format!(
                "unknown sort direction '{other}' (expected asc or desc)"
            ))),
        }
    }
}

/// Dashboard filters. `page` is 1-based; `page_size` is clamped to
/// `1..=MAX_PAGE_SIZE` when the query runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardFilter {
    /// Restrict to leads owned by this user. `None` shows every result.
    pub user_id: Option<Uuid>,
    pub window: DateWindow,
    /// Empty means no tag filter.
    pub tags: Vec<String>,
    pub should_contact_only: bool,
    pub score: Option<ScoreFilter>,
    pub location_substr: Option<String>,
    pub sort_dir: SortDir,
    pub page: u32,
    pub page_size: u32,
}

impl DashboardFilter {
    /// Unfiltered first page over `window`.
    #[must_use]
    pub fn new(window: DateWindow) -> Self {
        Self {
            user_id: None,
            window,
            tags: Vec::new(),
            should_contact_only: false,
            score: None,
            location_substr: None,
            sort_dir: SortDir::default(),
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    #[must_use]
    pub fn effective_page_size(&self) -> u32 {
        self.page_size.clamp(1, MAX_PAGE_SIZE)
    }

    #[must_use]
    pub fn offset(&self) -> i64 {
        i64::from(self.page.max(1) - 1) * i64::from(self.effective_page_size())
    }

    fn tags_param(&self) -> Option<Vec<String>> {
        let tags: Vec<String> = self
            .tags
            .iter()
            .map(String::as_str)
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(ToOwned::to_owned)
            .collect();
        if tags.is_empty() {
            None
        } else {
            Some(tags)
        }
    }

    fn location_param(&self) -> Option<&str> {
        self.location_substr
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// One processor result with the lead context shown in the dashboard table.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct DashboardRow {
    pub result_id: i64,
    pub created_at: DateTime<Utc>,
    pub lead_id: String,
    pub tag: Option<String>,
    pub name: Option<String>,
    pub title: Option<String>,
    pub company_name: Option<String>,
    pub location: Option<String>,
    pub linkedin_url: Option<String>,
    pub score: Option<i32>,
    pub should_contact: Option<bool>,
    pub subject: Option<String>,
    pub message: Option<String>,
}

/// Returns one page of processor results matching `filter`, ordered by result
/// time in the requested direction.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn fetch_dashboard(
    pool: &PgPool,
    filter: &DashboardFilter,
) -> Result<Vec<DashboardRow>, DbError> {
    let (from, to) = filter.window.bounds();

    let rows = sqlx::query_as::<_, DashboardRow>(
        "SELECT \
             r.id AS result_id, r.created_at, r.lead_id, \
             l.tag, l.name, l.title, l.company_name, l.location, l.linkedin_url, \
             r.score, r.should_contact, r.subject, r.message \
         FROM llm_response r \
         LEFT JOIN all_leads l ON l.lead_id = r.lead_id \
         WHERE r.created_at >= $1 \
           AND r.created_at < $2 \
           AND ($3::UUID IS NULL OR l.user_id = $3) \
           AND ($4::TEXT[] IS NULL OR btrim(l.tag) = ANY($4)) \
           AND ($5::BOOLEAN = false OR r.should_contact IS TRUE) \
           AND ($6::TEXT IS NULL OR CASE $6 \
                 WHEN '>'  THEN r.score >  $7::INTEGER \
                 WHEN '>=' THEN r.score >= $7::INTEGER \
                 WHEN '='  THEN r.score =  $7::INTEGER \
                 WHEN '<=' THEN r.score <= $7::INTEGER \
                 WHEN '<'  THEN r.score <  $7::INTEGER \
                 ELSE false END) \
           AND ($8::TEXT IS NULL OR strpos(lower(l.location), lower($8)) > 0) \
         ORDER BY \
             CASE WHEN $9::TEXT = 'asc' THEN r.created_at END ASC, \
             CASE WHEN $9::TEXT = 'desc' THEN r.created_at END DESC, \
             r.id \
         LIMIT $10 OFFSET $11",
    )
    .bind(from)
    .bind(to)
    .bind(filter.user_id)
    .bind(filter.tags_param())
    .bind(filter.should_contact_only)
    .bind(filter.score.map(|s| s.op.as_str()))
    .bind(filter.score.map(|s| s.value))
    .bind(filter.location_param())
    .bind(filter.sort_dir.as_str())
    .bind(i64::from(filter.effective_page_size()))
    .bind(filter.offset())
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Distinct, trimmed, non-empty tags of leads that have a processor result in
/// `window`, sorted.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_result_tags(
    pool: &PgPool,
    window: &DateWindow,
    user_id: Option<Uuid>,
) -> Result<Vec<String>, DbError> {
    let (from, to) = window.bounds();

    let tags = sqlx::query_scalar::<_, String>(
        "SELECT DISTINCT btrim(l.tag) AS tag \
         FROM llm_response r \
         JOIN all_leads l ON l.lead_id = r.lead_id \
         WHERE r.created_at >= $1 \
           AND r.created_at < $2 \
           AND ($3::UUID IS NULL OR l.user_id = $3) \
           AND l.tag IS NOT NULL \
           AND btrim(l.tag) <> '' \
         ORDER BY 1",
    )
    .bind(from)
    .bind(to)
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(tags)
}
