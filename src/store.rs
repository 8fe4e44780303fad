use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::{TrackerError, TrackerResult};
use crate::kv::KeyValueStore;
use crate::models::{Identity, JobApplication, JobFormData, JobStatus, StatusFilter, TypeFilter};
use crate::notify::Notifier;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

pub fn jobs_key(user_id: &str) -> String {
    format!("jobs_{}", user_id)
}

/// Records matching `filter`, in their stored order.
pub fn filter_by_status(
    records: &[JobApplication],
    filter: StatusFilter,
) -> impl Iterator<Item = &JobApplication> {
    records.iter().filter(move |job| filter.matches(job.status))
}

pub fn filter_by_type(
    records: &[JobApplication],
    filter: TypeFilter,
) -> impl Iterator<Item = &JobApplication> {
    records.iter().filter(move |job| filter.matches(job.job_type))
}

/// Trims free text and rejects a form that would put bad data in storage.
pub fn validate_form(mut form: JobFormData) -> TrackerResult<JobFormData> {
    form.title = form.title.trim().to_string();
    form.company = form.company.trim().to_string();
    if form.title.is_empty() {
        return Err(TrackerError::Validation("Job title is required".to_string()));
    }
    if form.company.is_empty() {
        return Err(TrackerError::Validation("Company name is required".to_string()));
    }

    form.contact_email = form
        .contact_email
        .map(|e| e.trim().to_string())
        .filter(|e| !e.is_empty());
    if let Some(email) = &form.contact_email {
        if !EMAIL_RE.is_match(email) {
            return Err(TrackerError::Validation(format!("Invalid email address '{}'", email)));
        }
    }

    Ok(form)
}

/// The current identity's job applications, newest first.
pub struct RecordStore<'a> {
    kv: &'a dyn KeyValueStore,
    clock: &'a dyn Clock,
    notifier: &'a dyn Notifier,
    owner: Option<String>,
    records: Vec<JobApplication>,
}

impl<'a> RecordStore<'a> {
    pub fn new(kv: &'a dyn KeyValueStore, clock: &'a dyn Clock, notifier: &'a dyn Notifier) -> Self {
        Self {
            kv,
            clock,
            notifier,
            owner: None,
            records: Vec::new(),
        }
    }

    pub(crate) fn clock(&self) -> &'a dyn Clock {
        self.clock
    }

    /// Replaces the in-memory list with the one persisted for `identity`.
    /// With no identity the list is empty and storage is not touched.
    pub fn set_identity(&mut self, identity: Option<&Identity>) -> TrackerResult<()> {
        self.records.clear();
        self.owner = identity.map(|user| user.id.clone());

        let Some(owner) = &self.owner else {
            return Ok(());
        };
        let key = jobs_key(owner);
        if let Some(raw) = self.kv.get(&key)? {
            match serde_json::from_str::<Vec<JobApplication>>(&raw) {
                Ok(records) => self.records = records,
                Err(e) => {
                    warn!(key = %key, error = %e, "discarding malformed job list");
                    self.kv.remove(&key)?;
                }
            }
        }
        debug!(user_id = %owner, count = self.records.len(), "loaded job applications");
        Ok(())
    }

    pub fn records(&self) -> &[JobApplication] {
        &self.records
    }

    pub fn add(&mut self, form: JobFormData) -> TrackerResult<String> {
        let Some(owner) = self.owner.clone() else {
            self.notifier.failure("You must be logged in to add a job");
            return Err(TrackerError::Unauthenticated);
        };
        let form = self.checked(form)?;

        let now = self.clock.now();
        let mut job = JobApplication {
            id: Uuid::new_v4().to_string(),
            user_id: owner,
            title: String::new(),
            company: String::new(),
            application_date: form.application_date,
            status: form.status,
            contact_person: None,
            contact_email: None,
            notes: None,
            location: None,
            salary: None,
            job_type: None,
            application_method: None,
            follow_up_date: None,
            created_at: now,
            updated_at: now,
        };
        job.apply_form(form);
        let id = job.id.clone();

        self.records.insert(0, job);
        if let Err(e) = self.persist() {
            self.records.remove(0);
            return Err(e);
        }

        info!(job_id = %id, "added job application");
        self.notifier.success("Job application added successfully");
        Ok(id)
    }

    /// Overwrites the editable fields of record `id`. Returns false when no
    /// such record exists.
    pub fn update(&mut self, id: &str, form: JobFormData) -> TrackerResult<bool> {
        self.require_owner("You must be logged in to update a job")?;
        let form = self.checked(form)?;

        let now = self.clock.now();
        let Some(index) = self.records.iter().position(|job| job.id == id) else {
            debug!(job_id = %id, "update of unknown job ignored");
            return Ok(false);
        };

        let previous = self.records[index].clone();
        let job = &mut self.records[index];
        job.apply_form(form);
        job.updated_at = now.max(previous.updated_at);

        if let Err(e) = self.persist() {
            self.records[index] = previous;
            return Err(e);
        }

        info!(job_id = %id, "updated job application");
        self.notifier.success("Job application updated successfully");
        Ok(true)
    }

    /// Removes record `id`. Returns false when no such record exists.
    pub fn delete(&mut self, id: &str) -> TrackerResult<bool> {
        self.require_owner("You must be logged in to delete a job")?;

        let Some(index) = self.records.iter().position(|job| job.id == id) else {
            debug!(job_id = %id, "delete of unknown job ignored");
            return Ok(false);
        };

        let removed = self.records.remove(index);
        if let Err(e) = self.persist() {
            self.records.insert(index, removed);
            return Err(e);
        }

        info!(job_id = %id, "deleted job application");
        self.notifier.success("Job application deleted successfully");
        Ok(true)
    }

    pub fn get(&self, id: &str) -> Option<&JobApplication> {
        self.records.iter().find(|job| job.id == id)
    }

    pub fn list_by_status(&self, filter: StatusFilter) -> Vec<&JobApplication> {
        filter_by_status(&self.records, filter).collect()
    }

    pub fn list_by_type(&self, filter: TypeFilter) -> Vec<&JobApplication> {
        filter_by_type(&self.records, filter).collect()
    }

    /// Distinct company names across the current records.
    pub fn popular_companies(&self) -> Vec<String> {
        self.records
            .iter()
            .map(|job| job.company.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Kanban columns, one per status in workflow order.
    pub fn board(&self) -> Vec<(JobStatus, Vec<&JobApplication>)> {
        JobStatus::ALL
            .iter()
            .map(|&status| (status, self.list_by_status(StatusFilter::Only(status))))
            .collect()
    }

    fn require_owner(&self, message: &str) -> TrackerResult<()> {
        if self.owner.is_none() {
            self.notifier.failure(message);
            return Err(TrackerError::Unauthenticated);
        }
        Ok(())
    }

    fn checked(&self, form: JobFormData) -> TrackerResult<JobFormData> {
        validate_form(form).inspect_err(|e| self.notifier.failure(&e.to_string()))
    }

    fn persist(&self) -> TrackerResult<()> {
        let Some(owner) = &self.owner else {
            return Ok(());
        };
        let raw = serde_json::to_string(&self.records).map_err(|e| TrackerError::Storage(e.into()))?;
        self.kv.set(&jobs_key(owner), &raw)?;
        debug!(user_id = %owner, count = self.records.len(), "persisted job applications");
        Ok(())
    }
}
