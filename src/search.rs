use std::time::Duration;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::clock::Clock;
use crate::config::SearchConfig;
use crate::error::{SearchError, TrackerResult};
use crate::models::{JobFormData, JobStatus};
use crate::store::RecordStore;

pub const DEFAULT_RADIUS: u32 = 25;
pub const DEFAULT_LIMIT: u32 = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct SearchParams {
    pub keyword: String,
    pub location: String,
    pub radius: Option<u32>,
    pub page: u32,
    pub limit: u32,
}

impl SearchParams {
    pub fn new(keyword: &str, location: &str) -> Self {
        Self {
            keyword: keyword.to_string(),
            location: location.to_string(),
            radius: Some(DEFAULT_RADIUS),
            page: 1,
            limit: DEFAULT_LIMIT,
        }
    }

    /// Query pairs in wire order; blank or zero values are left out.
    fn query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if !self.keyword.is_empty() {
            query.push(("query", self.keyword.clone()));
        }
        if !self.location.is_empty() {
            query.push(("location", self.location.clone()));
        }
        if let Some(radius) = self.radius.filter(|r| *r > 0) {
            query.push(("radius", radius.to_string()));
        }
        if self.page > 0 {
            query.push(("page", self.page.to_string()));
        }
        if self.limit > 0 {
            query.push(("limit", self.limit.to_string()));
        }
        query
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Salary {
    pub minimum: f64,
    pub maximum: f64,
    pub currency_code: Option<String>,
    pub time_unit: String,
}

impl Salary {
    pub fn describe(&self) -> String {
        let currency = self.currency_code.as_deref().unwrap_or("USD");
        let amount = if self.minimum == self.maximum {
            format!("{} {:.0}", currency, self.minimum)
        } else {
            format!("{} {:.0} - {:.0}", currency, self.minimum, self.maximum)
        };
        match self.time_unit.trim() {
            "" => amount,
            unit => format!("{} / {}", amount, unit.to_lowercase()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExternalListing {
    pub job_id: String,
    pub employer_name: String,
    pub job_title: String,
    pub location_name: String,
    pub job_description: String,
    pub posting_date: String,
    pub salary: Option<Salary>,
    pub job_type: Option<Vec<String>>,
    pub apply_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPage {
    pub jobs: Vec<ExternalListing>,
    pub total_results: u64,
    pub current_page: u32,
    pub total_pages: u32,
}

impl SearchPage {
    pub fn empty() -> Self {
        Self {
            jobs: Vec::new(),
            total_results: 0,
            current_page: 1,
            total_pages: 1,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawSearchPage {
    jobs: Option<Vec<serde_json::Value>>,
    total_results: Option<u64>,
    current_page: Option<u32>,
    total_pages: Option<u32>,
}

/// Fills the gaps a sparse response leaves; zero pages read as one.
/// A listing that does not parse is dropped, not the page.
fn normalize(raw: RawSearchPage) -> SearchPage {
    let jobs = raw
        .jobs
        .unwrap_or_default()
        .into_iter()
        .filter_map(|value| {
            serde_json::from_value::<ExternalListing>(value)
                .inspect_err(|e| warn!(error = %e, "skipping malformed listing"))
                .ok()
        })
        .collect();
    SearchPage {
        jobs,
        total_results: raw.total_results.unwrap_or(0),
        current_page: raw.current_page.filter(|p| *p > 0).unwrap_or(1),
        total_pages: raw.total_pages.filter(|p| *p > 0).unwrap_or(1),
    }
}

/// Thin client over the external listing lookup.
pub struct JobSearch {
    config: SearchConfig,
    client: reqwest::blocking::Client,
}

impl JobSearch {
    pub fn new(config: SearchConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self { config, client })
    }

    pub fn try_search(&self, params: &SearchParams) -> Result<SearchPage, SearchError> {
        let url = format!("{}/search", self.config.base_url);
        debug!(url = %url, page = params.page, "searching listings");

        let response = self
            .client
            .get(&url)
            .query(&params.query())
            .header("X-RapidAPI-Key", &self.config.api_key)
            .header("X-RapidAPI-Host", &self.config.api_host)
            .send()?;

        if !response.status().is_success() {
            return Err(SearchError::Status(response.status().as_u16()));
        }

        let raw: RawSearchPage = response.json()?;
        Ok(normalize(raw))
    }

    /// Any failure reads as an empty first page.
    pub fn search(&self, params: &SearchParams) -> SearchPage {
        self.try_search(params).unwrap_or_else(|e| {
            warn!(error = %e, "listing search failed");
            SearchPage::empty()
        })
    }

    pub fn try_get_listing(&self, job_id: &str) -> Result<ExternalListing, SearchError> {
        let url = format!("{}/job-details", self.config.base_url);
        debug!(url = %url, job_id = %job_id, "fetching listing");

        let response = self
            .client
            .get(&url)
            .query(&[("id", job_id)])
            .header("X-RapidAPI-Key", &self.config.api_key)
            .header("X-RapidAPI-Host", &self.config.api_host)
            .send()?;

        if !response.status().is_success() {
            return Err(SearchError::Status(response.status().as_u16()));
        }

        Ok(response.json()?)
    }

    #[allow(dead_code)]
    pub fn get_listing(&self, job_id: &str) -> Option<ExternalListing> {
        self.try_get_listing(job_id)
            .inspect_err(|e| warn!(error = %e, job_id = %job_id, "listing lookup failed"))
            .ok()
    }
}

/// The form a tracked listing starts out as.
pub fn listing_to_form(listing: &ExternalListing, today: NaiveDate) -> JobFormData {
    let mut form = JobFormData::new(&listing.job_title, &listing.employer_name, today, JobStatus::Applied);
    form.location = Some(listing.location_name.clone()).filter(|l| !l.is_empty());
    // Tags outside the known job types are dropped.
    form.job_type = listing
        .job_type
        .as_ref()
        .and_then(|tags| tags.first())
        .and_then(|tag| tag.parse().ok());
    form.notes = Some(format!(
        "Job Description:\n{}\n\nApply URL: {}",
        listing.job_description,
        listing.apply_url.as_deref().unwrap_or("Not available")
    ));
    form
}

pub fn track_listing(store: &mut RecordStore<'_>, listing: &ExternalListing) -> TrackerResult<String> {
    let form = listing_to_form(listing, store.clock().today());
    store.add(form)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::kv::MemoryStore;
    use crate::models::{Identity, JobType};
    use crate::notify::RecordingNotifier;

    fn listing() -> ExternalListing {
        serde_json::from_str(
            r#"{
                "jobId": "abc123",
                "employerName": "Acme",
                "jobTitle": "Backend Engineer",
                "locationName": "Austin, TX",
                "jobDescription": "Build services.",
                "postingDate": "2024-05-01",
                "salary": {"minimum": 120000, "maximum": 150000, "currencyCode": "USD", "timeUnit": "YEAR"},
                "jobType": ["Full-time", "Remote"],
                "applyUrl": "https://acme.example/apply"
            }"#,
        )
        .unwrap()
    }

    fn unreachable() -> JobSearch {
        JobSearch::new(SearchConfig {
            api_key: "test".to_string(),
            api_host: "localhost".to_string(),
            // Port 9 (discard) is closed on test hosts; the connect is refused.
            base_url: "http://127.0.0.1:9".to_string(),
        })
        .unwrap()
    }

    #[test]
    fn test_normalize_fills_defaults() {
        let raw: RawSearchPage = serde_json::from_str(r#"{"totalResults": 0}"#).unwrap();
        assert_eq!(normalize(raw), SearchPage::empty());

        let raw: RawSearchPage =
            serde_json::from_str(r#"{"jobs": [{"jobId": "x", "jobTitle": "Dev"}], "totalResults": 42, "currentPage": 0, "totalPages": 5}"#)
                .unwrap();
        let page = normalize(raw);
        assert_eq!(page.jobs.len(), 1);
        assert_eq!(page.jobs[0].job_title, "Dev");
        assert_eq!(page.jobs[0].employer_name, "");
        assert_eq!(page.total_results, 42);
        assert_eq!(page.current_page, 1);
        assert_eq!(page.total_pages, 5);
    }

    #[test]
    fn test_partial_listings_keep_the_page() {
        let raw: RawSearchPage = serde_json::from_str(
            r#"{
                "jobs": [
                    {"jobId": "a", "jobTitle": "Dev", "salary": {"minimum": 1, "maximum": 2}},
                    {"jobId": "b", "jobTitle": 42},
                    {"jobId": "c", "jobTitle": "Ops"}
                ],
                "totalResults": 3
            }"#,
        )
        .unwrap();
        let page = normalize(raw);

        let ids: Vec<_> = page.jobs.iter().map(|j| j.job_id.as_str()).collect();
        assert_eq!(ids, ["a", "c"]);
        let salary = page.jobs[0].salary.as_ref().unwrap();
        assert_eq!(salary.time_unit, "");
        assert_eq!(salary.describe(), "USD 1 - 2");
        assert_eq!(page.total_results, 3);
    }

    #[test]
    fn test_query_skips_unset_parameters() {
        let mut params = SearchParams::new("rust", "");
        params.radius = None;
        params.page = 2;
        assert_eq!(
            params.query(),
            vec![
                ("query", "rust".to_string()),
                ("page", "2".to_string()),
                ("limit", "10".to_string()),
            ]
        );
    }

    #[test]
    fn test_failed_lookup_degrades_to_empty_page() {
        let search = unreachable();
        let params = SearchParams::new("rust", "Austin");

        assert!(search.try_search(&params).is_err());
        assert_eq!(search.search(&params), SearchPage::empty());
        assert!(search.get_listing("abc123").is_none());
    }

    #[test]
    fn test_listing_to_form_mapping() {
        let today: NaiveDate = "2024-06-01".parse().unwrap();
        let form = listing_to_form(&listing(), today);

        assert_eq!(form.title, "Backend Engineer");
        assert_eq!(form.company, "Acme");
        assert_eq!(form.application_date, today);
        assert_eq!(form.status, JobStatus::Applied);
        assert_eq!(form.location.as_deref(), Some("Austin, TX"));
        assert_eq!(form.job_type, Some(JobType::FullTime));
        assert_eq!(
            form.notes.as_deref(),
            Some("Job Description:\nBuild services.\n\nApply URL: https://acme.example/apply")
        );

        let mut bare = listing();
        bare.apply_url = None;
        bare.job_type = Some(vec!["Temporary".to_string()]);
        let form = listing_to_form(&bare, today);
        assert_eq!(form.job_type, None);
        assert!(form.notes.unwrap().ends_with("Apply URL: Not available"));
    }

    #[test]
    fn test_track_listing_adds_record() {
        let kv = MemoryStore::new();
        let clock = ManualClock::at("2024-06-01T15:30:00Z");
        let notifier = RecordingNotifier::default();
        let mut store = RecordStore::new(&kv, &clock, &notifier);
        store
            .set_identity(Some(&Identity {
                id: "u1".to_string(),
                email: "a@x.com".to_string(),
                created_at: clock.now(),
            }))
            .unwrap();

        let id = track_listing(&mut store, &listing()).unwrap();
        let job = store.get(&id).unwrap();
        assert_eq!(job.title, "Backend Engineer");
        assert_eq!(job.application_date.to_string(), "2024-06-01");
    }

    #[test]
    fn test_salary_description() {
        let salary = listing().salary.unwrap();
        assert_eq!(salary.describe(), "USD 120000 - 150000 / year");
    }
}
