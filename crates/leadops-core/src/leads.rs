use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A prospective contact as returned by the unsent-lead queries.
///
/// Every descriptive field is optional. Serialization always emits each
/// field, writing `null` for absent values, because the external processor
/// expects the full field set on every lead.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lead {
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

/// A lead row produced by bulk ingestion, ready to insert into `all_leads`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLead {
    pub lead_id: String,
    pub linkedin_url: String,
    pub bio: String,
    pub tag: String,
    pub user_id: Uuid,
}
