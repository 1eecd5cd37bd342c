//! Live integration tests for leadops-db using `#[sqlx::test]`.
//!
//! Each test gets a fresh, fully-migrated Postgres database spun up by the
//! sqlx test harness. The `migrations` path is relative to the crate root
//! (`crates/leadops-db/`), so `"../../migrations"` resolves to the workspace
//! migration directory.

use chrono::{Duration, Utc};
use leadops_core::{NewLead, NewScrapeRequest, PromptConfig};
use leadops_db::{
    fetch_dashboard, fetch_unsent_leads, get_prompt, insert_api_key, insert_lead, insert_prompt,
    insert_scrape_request, list_api_keys, list_prompts, list_result_tags, list_scrape_requests,
    DashboardFilter, DateWindow, DbError, ScoreFilter, ScoreOp, SortDir, UnsentLeadsQuery,
};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn new_lead(lead_id: &str, tag: &str, user_id: Uuid) -> NewLead {
    NewLead {
        lead_id: lead_id.to_string(),
        linkedin_url: format!("https://www.linkedin.com/in/{lead_id}"),
        bio: "Founder".to_string(),
        tag: tag.to_string(),
        user_id,
    }
}

async fn insert_result(
    pool: &sqlx::PgPool,
    lead_id: &str,
    score: i32,
    should_contact: bool,
    created_at: chrono::DateTime<Utc>,
) {
    sqlx::query(
        "INSERT INTO llm_response (lead_id, score, should_contact, subject, message, created_at) \
         VALUES ($1, $2, $3, 'Hello', 'Hi there', $4)",
    )
    .bind(lead_id)
    .bind(score)
    .bind(should_contact)
    .bind(created_at)
    .execute(pool)
    .await
    .unwrap_or_else(|e| panic!("insert_result failed for '{lead_id}': {e}"));
}

async fn set_location(pool: &sqlx::PgPool, lead_id: &str, location: &str) {
    sqlx::query("UPDATE all_leads SET location = $2 WHERE lead_id = $1")
        .bind(lead_id)
        .bind(location)
        .execute(pool)
        .await
        .unwrap_or_else(|e| panic!("set_location failed for '{lead_id}': {e}"));
}

fn today_window() -> DateWindow {
    DateWindow::default_for(Utc::now().date_naive())
}

// ---------------------------------------------------------------------------
// Leads
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn duplicate_lead_is_a_unique_violation(pool: sqlx::PgPool) {
    let user = Uuid::new_v4();
    insert_lead(&pool, &new_lead("janedoe123", "SDR", user))
        .await
        .expect("first insert");

    let err = insert_lead(&pool, &new_lead("janedoe123", "SDR", user))
        .await
        .expect_err("duplicate must fail");
    assert!(err.is_unique_violation());
}

#[sqlx::test(migrations = "../../migrations")]
async fn unsent_leads_exclude_processed_and_other_users(pool: sqlx::PgPool) {
    let user = Uuid::new_v4();
    let other = Uuid::new_v4();
    for id in ["a-lead", "b-lead", "c-lead"] {
        insert_lead(&pool, &new_lead(id, "SDR", user))
            .await
            .expect("insert");
    }
    insert_lead(&pool, &new_lead("someone-else", "SDR", other))
        .await
        .expect("insert other");
    insert_result(&pool, "b-lead", 80, true, Utc::now()).await;

    for query in [UnsentLeadsQuery::ByUser, UnsentLeadsQuery::Alternate] {
        let leads = fetch_unsent_leads(&pool, query, user)
            .await
            .expect("fetch unsent");
        let ids: Vec<_> = leads.iter().filter_map(|l| l.lead_id.as_deref()).collect();
        assert_eq!(ids, vec!["a-lead", "c-lead"], "query {query:?}");
        assert_eq!(leads[0].tag.as_deref(), Some("SDR"));
        assert_eq!(leads[0].bio.as_deref(), Some("Founder"));
        assert!(leads[0].name.is_none());
    }
}

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn api_keys_are_deduplicated(pool: sqlx::PgPool) {
    assert!(list_api_keys(&pool).await.expect("list").is_empty());

    assert!(insert_api_key(&pool, "key-1").await.expect("insert"));
    assert!(!insert_api_key(&pool, "key-1").await.expect("re-insert"));
    assert!(insert_api_key(&pool, "key-2").await.expect("insert"));

    let mut keys = list_api_keys(&pool).await.expect("list");
    keys.sort();
    assert_eq!(keys, vec!["key-1", "key-2"]);
}

// ---------------------------------------------------------------------------
// Prompts
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn prompts_are_scoped_to_their_owner(pool: sqlx::PgPool) {
    let owner = Uuid::new_v4();
    let stranger = Uuid::new_v4();
    let config = PromptConfig::new("About us", "ICP", "Write a note");

    let saved = insert_prompt(&pool, owner, "SDR", &config)
        .await
        .expect("insert prompt");
    assert_eq!(saved.tag, "SDR");

    let fetched = get_prompt(&pool, saved.id, owner).await.expect("get");
    assert_eq!(fetched.prompt_config(), config);

    let err = get_prompt(&pool, saved.id, stranger)
        .await
        .expect_err("stranger cannot read");
    assert!(matches!(err, DbError::NotFound));

    assert_eq!(list_prompts(&pool, owner, 10).await.expect("list").len(), 1);
    assert!(list_prompts(&pool, stranger, 10)
        .await
        .expect("list")
        .is_empty());
}

// ---------------------------------------------------------------------------
// Scrape requests
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn scrape_request_round_trip(pool: sqlx::PgPool) {
    let user = Uuid::new_v4();
    let request = NewScrapeRequest {
        keywords: Some("salesforce ai".to_string()),
        search_url: None,
        tag: "Dreamforce".to_string(),
        load_time: 3,
        scrape_likes: false,
    };

    let row = insert_scrape_request(&pool, user, &request)
        .await
        .expect("insert");
    assert_eq!(row.request_by, user);
    assert!(!row.is_fulfilled);
    assert!(!row.scrape_likes);

    let rows = list_scrape_requests(&pool, user, 500).await.expect("list");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].keywords.as_deref(), Some("salesforce ai"));
}

#[sqlx::test(migrations = "../../migrations")]
async fn scrape_request_with_both_targets_violates_check(pool: sqlx::PgPool) {
    let request = NewScrapeRequest {
        keywords: Some("ai".to_string()),
        search_url: Some("https://www.linkedin.com/search".to_string()),
        tag: "t".to_string(),
        load_time: 1,
        scrape_likes: true,
    };

    let result = insert_scrape_request(&pool, Uuid::new_v4(), &request).await;
    assert!(result.is_err());
}

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn dashboard_filters_by_score_contact_tag_and_location(pool: sqlx::PgPool) {
    let user = Uuid::new_v4();
    let now = Utc::now();
    insert_lead(&pool, &new_lead("alpha", "SDR", user))
        .await
        .expect("insert");
    insert_lead(&pool, &new_lead("beta", " Founders ", user))
        .await
        .expect("insert");
    insert_lead(&pool, &new_lead("gamma", "SDR", user))
        .await
        .expect("insert");
    set_location(&pool, "alpha", "Berlin, Germany").await;
    set_location(&pool, "gamma", "Paris, France").await;

    insert_result(&pool, "alpha", 90, true, now - Duration::hours(2)).await;
    insert_result(&pool, "beta", 40, false, now - Duration::hours(1)).await;
    insert_result(&pool, "gamma", 70, true, now).await;
    insert_result(&pool, "alpha", 10, false, now - Duration::days(30)).await;

    let mut filter = DashboardFilter::new(today_window());
    filter.user_id = Some(user);

    let all = fetch_dashboard(&pool, &filter).await.expect("fetch");
    let ids: Vec<_> = all.iter().map(|r| r.lead_id.as_str()).collect();
    assert_eq!(ids, vec!["gamma", "beta", "alpha"], "desc by result time");

    filter.sort_dir = SortDir::Asc;
    let asc = fetch_dashboard(&pool, &filter).await.expect("fetch");
    assert_eq!(asc[0].lead_id, "alpha");

    filter.should_contact_only = true;
    assert_eq!(fetch_dashboard(&pool, &filter).await.expect("fetch").len(), 2);

    filter.score = Some(ScoreFilter {
        op: ScoreOp::Gte,
        value: 80,
    });
    let high = fetch_dashboard(&pool, &filter).await.expect("fetch");
    assert_eq!(high.len(), 1);
    assert_eq!(high[0].lead_id, "alpha");

    let mut by_tag = DashboardFilter::new(today_window());
    by_tag.tags = vec!["Founders".to_string()];
    let founders = fetch_dashboard(&pool, &by_tag).await.expect("fetch");
    assert_eq!(founders.len(), 1);
    assert_eq!(founders[0].lead_id, "beta");

    let mut by_location = DashboardFilter::new(today_window());
    by_location.location_substr = Some("paris".to_string());
    let paris = fetch_dashboard(&pool, &by_location).await.expect("fetch");
    assert_eq!(paris.len(), 1);
    assert_eq!(paris[0].lead_id, "gamma");
}

#[sqlx::test(migrations = "../../migrations")]
async fn dashboard_paginates(pool: sqlx::PgPool) {
    let user = Uuid::new_v4();
    let now = Utc::now();
    for (i, id) in ["p1", "p2", "p3"].iter().enumerate() {
        insert_lead(&pool, &new_lead(id, "SDR", user))
            .await
            .expect("insert");
        let offset = i64::try_from(i).expect("small index");
        insert_result(&pool, id, 50, true, now - Duration::minutes(offset)).await;
    }

    let mut filter = DashboardFilter::new(today_window());
    filter.page_size = 2;
    assert_eq!(fetch_dashboard(&pool, &filter).await.expect("page 1").len(), 2);

    filter.page = 2;
    let second = fetch_dashboard(&pool, &filter).await.expect("page 2");
    assert_eq!(second.len(), 1);
    assert_eq!(second[0].lead_id, "p3");
}

#[sqlx::test(migrations = "../../migrations")]
async fn result_tags_are_trimmed_distinct_and_sorted(pool: sqlx::PgPool) {
    let user = Uuid::new_v4();
    let now = Utc::now();
    for (id, tag) in [("t1", "  Zeta "), ("t2", "Alpha"), ("t3", "Alpha"), ("t4", "  ")] {
        insert_lead(&pool, &new_lead(id, tag, user))
            .await
            .expect("insert");
        insert_result(&pool, id, 1, false, now).await;
    }
    insert_lead(&pool, &new_lead("no-result", "Omega", user))
        .await
        .expect("insert");

    let tags = list_result_tags(&pool, &today_window(), Some(user))
        .await
        .expect("tags");
    assert_eq!(tags, vec!["Alpha", "Zeta"]);
}
