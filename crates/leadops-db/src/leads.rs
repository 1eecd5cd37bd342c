//! Database operations for `all_leads` and the unsent-lead SQL functions.

use leadops_core::{Lead, NewLead};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row returned by either unsent-lead function.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LeadRow {
    pub lead_id: Option<String>,
    pub tag: Option<String>,
    pub name: Option<String>,
    pub title: Option<String>,
    pub location: Option<String>,
    pub company_name: Option<String>,
    pub experience: Option<String>,
    pub skills: Option<String>,
    pub bio: Option<String>,
    pub profile_url: Option<String>,
    pub linkedin_url: Option<String>,
    pub company_page_url: Option<String>,
}

impl From<LeadRow> for Lead {
    fn from(row: LeadRow) -> Self {
        Lead {
            lead_id: row.lead_id,
            tag: row.tag,
            name: row.name,
            title: row.title,
            location: row.location,
            company_name: row.company_name,
            experience: row.experience,
            skills: row.skills,
            bio: row.bio,
            profile_url: row.profile_url,
            linkedin_url: row.linkedin_url,
            company_page_url: row.company_page_url,
        }
    }
}

/// The two interchangeable names under which a deployment may expose the
/// unsent-lead query. Both take a single user id and return the same shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsentLeadsQuery {
    /// `fetch_unsent_leads_by_user`, the documented name.
    ByUser,
    /// `fetch_unsent_leads`, the alternate name.
    Alternate,
}

impl UnsentLeadsQuery {
    #[must_use]
    pub const fn function_name(self) -> &'static str {
        match self {
            UnsentLeadsQuery::ByUser => "fetch_unsent_leads_by_user",
            UnsentLeadsQuery::Alternate => "fetch_unsent_leads",
        }
    }

    const fn sql(self) -> &'static str {
        match self {
            UnsentLeadsQuery::ByUser => {
                "SELECT lead_id, tag, name, title, location, company_name, experience, \
                        skills, bio, profile_url, linkedin_url, company_page_url \
                 FROM fetch_unsent_leads_by_user($1)"
            }
            UnsentLeadsQuery::Alternate => {
                "SELECT lead_id, tag, name, title, location, company_name, experience, \
                        skills, bio, profile_url, linkedin_url, company_page_url \
                 FROM fetch_unsent_leads($1)"
            }
        }
    }
}

/// Calls one of the unsent-lead functions for `user_id`, preserving the
/// order the function returns.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the call fails (including when the function
/// does not exist in this deployment).
pub async fn fetch_unsent_leads(
    pool: &PgPool,
    query: UnsentLeadsQuery,
    user_id: Uuid,
) -> Result<Vec<Lead>, DbError> {
    let rows = sqlx::query_as::<_, LeadRow>(query.sql())
        .bind(user_id)
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(Lead::from).collect())
}

/// Inserts one ingested lead. A duplicate `lead_id` surfaces as a
/// [`DbError::Sqlx`] for which [`DbError::is_unique_violation`] is `true`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_lead(pool: &PgPool, lead: &NewLead) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO all_leads (lead_id, linkedin_url, bio, tag, user_id) \
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(&lead.lead_id)
    .bind(&lead.linkedin_url)
    .bind(&lead.bio)
    .bind(&lead.tag)
    .bind(lead.user_id)
    .execute(pool)
    .await?;

    Ok(())
}
