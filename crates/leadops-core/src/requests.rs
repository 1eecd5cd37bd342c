//! Scrape requests submitted by operators for the external scraper to fulfil.

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// A scraping request as submitted, before validation.
///
/// Exactly one of `keywords` or `search_url` must be filled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewScrapeRequest {
    pub keywords: Option<String>,
    pub search_url: Option<String>,
    pub tag: String,
    /// Page load duration in seconds given to the scraper.
    pub load_time: i32,
    /// `true` runs the likes pipeline, `false` the posts pipeline.
    #[serde(default = "default_scrape_likes")]
    pub scrape_likes: bool,
}

fn default_scrape_likes() -> bool {
    true
}

impl NewScrapeRequest {
    /// Returns a normalised copy with trimmed text and blank options collapsed
    /// to `None`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] describing the first rule that failed.
    pub fn validated(&self) -> Result<NewScrapeRequest, ValidationError> {
        let keywords = non_blank(self.keywords.as_deref());
        let search_url = non_blank(self.search_url.as_deref());

        if keywords.is_some() == search_url.is_some() {
            return Err(ValidationError::new(
                "fill either keywords or search_url (one only)",
            ));
        }

        if let Some(kw) = keywords.as_deref() {
            if kw.contains([',', '\n', '\r']) {
                return Err(ValidationError::new(
                    "keywords must not contain commas or line breaks; separate them with single spaces",
                ));
            }
            if has_whitespace_run(kw) {
                return Err(ValidationError::new(
                    "collapse multiple spaces between keywords",
                ));
            }
        }

        let tag = self.tag.trim();
        if tag.is_empty() {
            return Err(ValidationError::new("tag is required"));
        }

        if self.load_time < 1 {
            return Err(ValidationError::new("load_time must be a number >= 1"));
        }

        Ok(NewScrapeRequest {
            keywords,
            search_url,
            tag: tag.to_string(),
            load_time: self.load_time,
            scrape_likes: self.scrape_likes,
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToOwned::to_owned)
}

fn has_whitespace_run(s: &str) -> bool {
    let mut prev_ws = false;
    for c in s.chars() {
        let ws = c.is_whitespace();
        if ws && prev_ws {
            return true;
        }
        prev_ws = ws;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(keywords: Option<&str>, search_url: Option<&str>) -> NewScrapeRequest {
        NewScrapeRequest {
            keywords: keywords.map(ToOwned::to_owned),
            search_url: search_url.map(ToOwned::to_owned),
            tag: "Dreamforce-Campaign".to_string(),
            load_time: 3,
            scrape_likes: true,
        }
    }

    #[test]
    fn accepts_keywords_only() {
        let ok = request(Some("  salesforce ai architect "), None)
            .validated()
            .expect("valid");
        assert_eq!(ok.keywords.as_deref(), Some("salesforce ai architect"));
        assert!(ok.search_url.is_none());
    }

    #[test]
    fn accepts_search_url_only_with_blank_keywords() {
        let ok = request(
            Some("   "),
            Some("https://www.linkedin.com/search/results/content/?keywords=ai"),
        )
        .validated()
        .expect("valid");
        assert!(ok.keywords.is_none());
        assert!(ok.search_url.is_some());
    }

    #[test]
    fn rejects_both_or_neither() {
        assert!(request(Some("ai"), Some("https://x")).validated().is_err());
        assert!(request(None, None).validated().is_err());
    }

    #[test]
    fn rejects_commas_and_double_spaces() {
        assert!(request(Some("ai,ml"), None).validated().is_err());
        assert!(request(Some("ai\nml"), None).validated().is_err());
        assert!(request(Some("ai  ml"), None).validated().is_err());
    }

    #[test]
    fn rejects_blank_tag_and_small_load_time() {
        let mut r = request(Some("ai"), None);
        r.tag = "  ".to_string();
        assert!(r.validated().is_err());

        let mut r = request(Some("ai"), None);
        r.load_time = 0;
        assert!(r.validated().is_err());
    }

    #[test]
    fn scrape_likes_defaults_to_true_when_absent() {
        let parsed: NewScrapeRequest =
            serde_json::from_str(r#"{"keywords":"ai","search_url":null,"tag":"t","load_time":5}"#)
                .expect("deserialize");
        assert!(parsed.scrape_likes);
    }
}
