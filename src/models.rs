use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: String,
    pub email: String, // display only, never verified
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub enum JobStatus {
    #[default]
    Applied,
    Interview,
    Offer,
    Rejected,
}

impl JobStatus {
    pub const ALL: [JobStatus; 4] = [
        JobStatus::Applied,
        JobStatus::Interview,
        JobStatus::Offer,
        JobStatus::Rejected,
    ];

    pub fn label(self) -> &'static str {
        match self {
            JobStatus::Applied => "Applied",
            JobStatus::Interview => "Interview",
            JobStatus::Offer => "Offer",
            JobStatus::Rejected => "Rejected",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum JobType {
    #[serde(rename = "Full-time")]
    FullTime,
    #[serde(rename = "Part-time")]
    PartTime,
    Internship,
    Remote,
    Contract,
}

impl JobType {
    pub const ALL: [JobType; 5] = [
        JobType::FullTime,
        JobType::PartTime,
        JobType::Internship,
        JobType::Remote,
        JobType::Contract,
    ];

    pub fn label(self) -> &'static str {
        match self {
            JobType::FullTime => "Full-time",
            JobType::PartTime => "Part-time",
            JobType::Internship => "Internship",
            JobType::Remote => "Remote",
            JobType::Contract => "Contract",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApplicationMethod {
    #[serde(rename = "Company Website")]
    CompanyWebsite,
    LinkedIn,
    Indeed,
    Referral,
    Email,
    Other,
}

impl ApplicationMethod {
    pub const ALL: [ApplicationMethod; 6] = [
        ApplicationMethod::CompanyWebsite,
        ApplicationMethod::LinkedIn,
        ApplicationMethod::Indeed,
        ApplicationMethod::Referral,
        ApplicationMethod::Email,
        ApplicationMethod::Other,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ApplicationMethod::CompanyWebsite => "Company Website",
            ApplicationMethod::LinkedIn => "LinkedIn",
            ApplicationMethod::Indeed => "Indeed",
            ApplicationMethod::Referral => "Referral",
            ApplicationMethod::Email => "Email",
            ApplicationMethod::Other => "Other",
        }
    }
}

/// Lowercases and strips separators so "Full-time", "full time" and
/// "FULL_TIME" all compare equal.
fn normalize_label(s: &str) -> String {
    s.chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_'))
        .flat_map(char::to_lowercase)
        .collect()
}

fn parse_label<T: Copy>(input: &str, variants: &[T], label: fn(T) -> &'static str, kind: &str) -> Result<T, String> {
    let wanted = normalize_label(input);
    variants
        .iter()
        .copied()
        .find(|v| normalize_label(label(*v)) == wanted)
        .ok_or_else(|| {
            let known: Vec<_> = variants.iter().map(|v| label(*v)).collect();
            format!("unknown {} '{}' (expected one of: {})", kind, input, known.join(", "))
        })
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_label(s, &JobStatus::ALL, JobStatus::label, "status")
    }
}

impl FromStr for JobType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_label(s, &JobType::ALL, JobType::label, "job type")
    }
}

impl FromStr for ApplicationMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_label(s, &ApplicationMethod::ALL, ApplicationMethod::label, "application method")
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl fmt::Display for ApplicationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Either every record or only those in one status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter {
    All,
    Only(JobStatus),
}

impl StatusFilter {
    pub fn matches(self, status: JobStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(s) => s == status,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("all") {
            Ok(StatusFilter::All)
        } else {
            s.parse().map(StatusFilter::Only)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeFilter {
    All,
    Only(JobType),
}

impl TypeFilter {
    /// Records without a job type only pass the `All` filter.
    pub fn matches(self, job_type: Option<JobType>) -> bool {
        match self {
            TypeFilter::All => true,
            TypeFilter::Only(t) => job_type == Some(t),
        }
    }
}

impl FromStr for TypeFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("all") {
            Ok(TypeFilter::All)
        } else {
            s.parse().map(TypeFilter::Only)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobApplication {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub company: String,
    pub application_date: NaiveDate,
    pub status: JobStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_person: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salary: Option<String>, // free text, e.g. "$120k - $140k"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_type: Option<JobType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_method: Option<ApplicationMethod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follow_up_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JobApplication {
    /// The editable part of the record, as a form would pre-fill it.
    pub fn to_form(&self) -> JobFormData {
        JobFormData {
            title: self.title.clone(),
            company: self.company.clone(),
            application_date: self.application_date,
            status: self.status,
            contact_person: self.contact_person.clone(),
            contact_email: self.contact_email.clone(),
            notes: self.notes.clone(),
            location: self.location.clone(),
            salary: self.salary.clone(),
            job_type: self.job_type,
            application_method: self.application_method,
            follow_up_date: self.follow_up_date,
        }
    }

    pub(crate) fn apply_form(&mut self, form: JobFormData) {
        self.title = form.title;
        self.company = form.company;
        self.application_date = form.application_date;
        self.status = form.status;
        self.contact_person = form.contact_person;
        self.contact_email = form.contact_email;
        self.notes = form.notes;
        self.location = form.location;
        self.salary = form.salary;
        self.job_type = form.job_type;
        self.application_method = form.application_method;
        self.follow_up_date = form.follow_up_date;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobFormData {
    pub title: String,
    pub company: String,
    pub application_date: NaiveDate,
    pub status: JobStatus,
    pub contact_person: Option<String>,
    pub contact_email: Option<String>,
    pub notes: Option<String>,
    pub location: Option<String>,
    pub salary: Option<String>,
    pub job_type: Option<JobType>,
    pub application_method: Option<ApplicationMethod>,
    pub follow_up_date: Option<NaiveDate>,
}

impl JobFormData {
    pub fn new(title: &str, company: &str, application_date: NaiveDate, status: JobStatus) -> Self {
        Self {
            title: title.to_string(),
            company: company.to_string(),
            application_date,
            status,
            contact_person: None,
            contact_email: None,
            notes: None,
            location: None,
            salary: None,
            job_type: None,
            application_method: None,
            follow_up_date: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_labels_parse_loosely() {
        assert_eq!("interview".parse::<JobStatus>().unwrap(), JobStatus::Interview);
        assert_eq!("full time".parse::<JobType>().unwrap(), JobType::FullTime);
        assert_eq!("PART_TIME".parse::<JobType>().unwrap(), JobType::PartTime);
        assert_eq!(
            "company-website".parse::<ApplicationMethod>().unwrap(),
            ApplicationMethod::CompanyWebsite
        );

        let err = "ghosted".parse::<JobStatus>().unwrap_err();
        assert!(err.contains("Applied, Interview, Offer, Rejected"));
    }

    #[test]
    fn test_filters() {
        assert_eq!("All".parse::<StatusFilter>().unwrap(), StatusFilter::All);
        assert_eq!(
            "offer".parse::<StatusFilter>().unwrap(),
            StatusFilter::Only(JobStatus::Offer)
        );
        assert!(StatusFilter::All.matches(JobStatus::Rejected));
        assert!(!StatusFilter::Only(JobStatus::Offer).matches(JobStatus::Applied));

        assert!(TypeFilter::All.matches(None));
        assert!(!TypeFilter::Only(JobType::Remote).matches(None));
        assert!(TypeFilter::Only(JobType::Remote).matches(Some(JobType::Remote)));
    }

    #[test]
    fn test_record_json_uses_display_labels() {
        let json = r#"{
            "id": "j1",
            "userId": "u1",
            "title": "Dev",
            "company": "Acme",
            "applicationDate": "2024-01-10",
            "status": "Interview",
            "jobType": "Full-time",
            "applicationMethod": "Company Website",
            "createdAt": "2024-01-10T09:00:00Z",
            "updatedAt": "2024-01-12T09:00:00Z"
        }"#;
        let job: JobApplication = serde_json::from_str(json).unwrap();
        assert_eq!(job.status, JobStatus::Interview);
        assert_eq!(job.job_type, Some(JobType::FullTime));
        assert_eq!(job.application_method, Some(ApplicationMethod::CompanyWebsite));
        assert_eq!(job.notes, None);

        let out = serde_json::to_string(&job).unwrap();
        assert!(out.contains(r#""applicationDate":"2024-01-10""#));
        assert!(out.contains(r#""jobType":"Full-time""#));
        assert!(!out.contains("followUpDate"));
    }
}
