use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::models::{JobApplication, JobStatus, JobType, StatusFilter};
use crate::store::filter_by_status;

const MILLIS_PER_DAY: i64 = 86_400_000;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub total_jobs: usize,
    pub status_counts: BTreeMap<JobStatus, usize>,
    pub type_counts: BTreeMap<JobType, usize>,
    pub average_response_time: Option<i64>,
    pub monthly_applications: BTreeMap<String, usize>,
    pub distinct_companies: usize,
}

pub fn compute_statistics(records: &[JobApplication]) -> Statistics {
    Statistics {
        total_jobs: count(records, StatusFilter::All),
        status_counts: status_counts(records),
        type_counts: type_counts(records),
        average_response_time: average_response_time(records),
        monthly_applications: monthly_counts(records),
        distinct_companies: distinct_companies(records),
    }
}

pub fn count(records: &[JobApplication], filter: StatusFilter) -> usize {
    filter_by_status(records, filter).count()
}

/// Every status is present, zero when unused.
pub fn status_counts(records: &[JobApplication]) -> BTreeMap<JobStatus, usize> {
    JobStatus::ALL
        .iter()
        .map(|&status| (status, count(records, StatusFilter::Only(status))))
        .collect()
}

/// Only types that occur; untyped records are left out.
pub fn type_counts(records: &[JobApplication]) -> BTreeMap<JobType, usize> {
    let mut counts = BTreeMap::new();
    for job_type in records.iter().filter_map(|job| job.job_type) {
        *counts.entry(job_type).or_insert(0) += 1;
    }
    counts
}

/// Applications per `YYYY-MM` month of the application date.
pub fn monthly_counts(records: &[JobApplication]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for job in records {
        *counts
            .entry(job.application_date.format("%Y-%m").to_string())
            .or_insert(0) += 1;
    }
    counts
}

/// Mean whole days from application to last update, over records that
/// reached Interview or Offer. Records updated before their application
/// date are skipped.
pub fn average_response_time(records: &[JobApplication]) -> Option<i64> {
    let days: Vec<i64> = records
        .iter()
        .filter(|job| matches!(job.status, JobStatus::Interview | JobStatus::Offer))
        .map(response_days)
        .filter(|d| *d >= 0)
        .collect();

    if days.is_empty() {
        return None;
    }
    let mean = days.iter().sum::<i64>() as f64 / days.len() as f64;
    Some(mean.round() as i64)
}

fn response_days(job: &JobApplication) -> i64 {
    let applied = job.application_date.and_time(chrono::NaiveTime::MIN).and_utc();
    (job.updated_at - applied).num_milliseconds().div_euclid(MILLIS_PER_DAY)
}

pub fn distinct_companies(records: &[JobApplication]) -> usize {
    records
        .iter()
        .map(|job| job.company.as_str())
        .collect::<BTreeSet<_>>()
        .len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, NaiveDate, Utc};

    fn job(status: JobStatus, applied: &str, updated: &str) -> JobApplication {
        let updated_at: DateTime<Utc> = DateTime::parse_from_rfc3339(updated).unwrap().with_timezone(&Utc);
        JobApplication {
            id: format!("{}-{}", applied, updated),
            user_id: "u1".to_string(),
            title: "Dev".to_string(),
            company: "Acme".to_string(),
            application_date: applied.parse::<NaiveDate>().unwrap(),
            status,
            contact_person: None,
            contact_email: None,
            notes: None,
            location: None,
            salary: None,
            job_type: None,
            application_method: None,
            follow_up_date: None,
            created_at: updated_at,
            updated_at,
        }
    }

    #[test]
    fn test_status_counts_sum_to_total() {
        let records = vec![
            job(JobStatus::Applied, "2024-01-01", "2024-01-01T00:00:00Z"),
            job(JobStatus::Applied, "2024-01-02", "2024-01-02T00:00:00Z"),
            job(JobStatus::Rejected, "2024-02-03", "2024-02-09T00:00:00Z"),
        ];
        let stats = compute_statistics(&records);

        assert_eq!(stats.total_jobs, 3);
        assert_eq!(stats.status_counts.len(), 4);
        assert_eq!(stats.status_counts[&JobStatus::Applied], 2);
        assert_eq!(stats.status_counts[&JobStatus::Interview], 0);
        assert_eq!(stats.status_counts.values().sum::<usize>(), records.len());
    }

    #[test]
    fn test_empty_list() {
        let stats = compute_statistics(&[]);
        assert_eq!(stats.total_jobs, 0);
        assert!(stats.status_counts.values().all(|c| *c == 0));
        assert!(stats.type_counts.is_empty());
        assert_eq!(stats.average_response_time, None);
        assert!(stats.monthly_applications.is_empty());
        assert_eq!(stats.distinct_companies, 0);
    }

    #[test]
    fn test_average_response_time_skips_negative_gaps() {
        let records = vec![
            job(JobStatus::Interview, "2024-01-10", "2024-01-15T00:00:00Z"),
            job(JobStatus::Interview, "2024-01-10", "2024-01-08T00:00:00Z"),
        ];
        assert_eq!(average_response_time(&records), Some(5));
    }

    #[test]
    fn test_average_response_time_floors_days_and_rounds_mean() {
        let records = vec![
            // 2 days 23 hours counts as 2
            job(JobStatus::Offer, "2024-01-10", "2024-01-12T23:00:00Z"),
            job(JobStatus::Interview, "2024-01-10", "2024-01-13T01:00:00Z"),
            // same-day update before midnight of the application date is excluded
            job(JobStatus::Interview, "2024-01-10", "2024-01-09T23:59:00Z"),
            // not a response status
            job(JobStatus::Rejected, "2024-01-01", "2024-03-01T00:00:00Z"),
        ];
        // (2 + 3) / 2 = 2.5 rounds to 3
        assert_eq!(average_response_time(&records), Some(3));
    }

    #[test]
    fn test_sub_second_gap_before_application_is_excluded() {
        let records = vec![job(JobStatus::Interview, "2024-01-10", "2024-01-09T23:59:59.500Z")];
        assert_eq!(average_response_time(&records), None);
    }

    #[test]
    fn test_average_response_time_unavailable() {
        let records = vec![
            job(JobStatus::Applied, "2024-01-10", "2024-01-15T00:00:00Z"),
            job(JobStatus::Offer, "2024-01-10", "2024-01-01T00:00:00Z"),
        ];
        assert_eq!(average_response_time(&records), None);
    }

    #[test]
    fn test_type_and_month_distributions() {
        let mut a = job(JobStatus::Applied, "2024-01-31", "2024-01-31T00:00:00Z");
        a.job_type = Some(JobType::Remote);
        let mut b = job(JobStatus::Applied, "2024-02-01", "2024-02-01T00:00:00Z");
        b.job_type = Some(JobType::Remote);
        b.company = "Initech".to_string();
        let c = job(JobStatus::Offer, "2023-12-15", "2024-01-02T00:00:00Z");
        let records = vec![a, b, c];

        let types = type_counts(&records);
        assert_eq!(types.len(), 1);
        assert_eq!(types[&JobType::Remote], 2);

        let months: Vec<_> = monthly_counts(&records).into_iter().collect();
        assert_eq!(
            months,
            vec![
                ("2023-12".to_string(), 1),
                ("2024-01".to_string(), 1),
                ("2024-02".to_string(), 1),
            ]
        );
        assert_eq!(distinct_companies(&records), 2);
    }

    #[test]
    fn test_statistics_json_shape() {
        let mut a = job(JobStatus::Interview, "2024-01-10", "2024-01-15T00:00:00Z");
        a.job_type = Some(JobType::FullTime);
        let value = serde_json::to_value(compute_statistics(&[a])).unwrap();

        assert_eq!(value["totalJobs"], 1);
        assert_eq!(value["statusCounts"]["Interview"], 1);
        assert_eq!(value["statusCounts"]["Offer"], 0);
        assert_eq!(value["typeCounts"]["Full-time"], 1);
        assert_eq!(value["averageResponseTime"], 5);
        assert_eq!(value["monthlyApplications"]["2024-01"], 1);
    }
}
