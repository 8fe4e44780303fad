mod auth;
mod clock;
mod config;
mod db;
mod error;
mod kv;
mod models;
mod notify;
mod search;
mod stats;
mod store;
mod tracker;

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use clock::{Clock, SystemClock};
use config::Config;
use db::Database;
use models::{ApplicationMethod, JobApplication, JobFormData, JobStatus, JobType, StatusFilter, TypeFilter};
use notify::ConsoleNotifier;
use search::{JobSearch, SearchParams};
use tracker::Tracker;

#[derive(Parser)]
#[command(name = "jobtrack")]
#[command(about = "Track job applications - log, filter, and review your search")]
struct Cli {
    /// Path to the database file
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Suppress success notices
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database and show where it lives
    Init,

    /// Log in as an email address (no password)
    Login {
        email: String,
    },

    /// Log out the current user
    Logout,

    /// Show the current user
    Whoami,

    /// Add a job application
    Add {
        /// Job title
        #[arg(short, long)]
        title: String,

        /// Company name
        #[arg(short, long)]
        company: String,

        /// Application date (YYYY-MM-DD), defaults to today
        #[arg(short, long)]
        date: Option<NaiveDate>,

        /// Status (applied, interview, offer, rejected)
        #[arg(short, long, default_value = "applied")]
        status: JobStatus,

        #[command(flatten)]
        details: DetailArgs,
    },

    /// Edit a job application; unspecified fields keep their value
    Edit {
        /// Job ID
        id: String,

        #[arg(short, long)]
        title: Option<String>,

        #[arg(short, long)]
        company: Option<String>,

        #[arg(short, long)]
        date: Option<NaiveDate>,

        #[arg(short, long)]
        status: Option<JobStatus>,

        #[command(flatten)]
        details: DetailArgs,
    },

    /// Delete a job application
    Delete {
        /// Job ID
        id: String,
    },

    /// Show job details
    Show {
        /// Job ID
        id: String,
    },

    /// List job applications
    List {
        /// Filter by status (all, applied, interview, offer, rejected)
        #[arg(short, long, default_value = "all")]
        status: StatusFilter,

        /// Filter by job type (all, full-time, part-time, internship, remote, contract)
        #[arg(short = 'y', long = "type", default_value = "all")]
        job_type: TypeFilter,
    },

    /// Show applications grouped by status
    Board,

    /// Show application statistics
    Stats {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the companies you have applied to
    Companies,

    /// Search external job listings
    Search {
        /// Job title or keywords
        keyword: String,

        /// City, state, or zip code
        location: String,

        /// Search radius in miles
        #[arg(short, long, default_value_t = search::DEFAULT_RADIUS)]
        radius: u32,

        /// Result page
        #[arg(short, long, default_value_t = 1)]
        page: u32,

        /// Results per page
        #[arg(short, long, default_value_t = search::DEFAULT_LIMIT)]
        limit: u32,
    },

    /// Track an external listing as a new application
    Track {
        /// Listing ID from `jobtrack search`
        listing_id: String,
    },
}

#[derive(Args)]
struct DetailArgs {
    /// Contact person
    #[arg(long)]
    contact: Option<String>,

    /// Contact email
    #[arg(long)]
    email: Option<String>,

    /// Free-text notes
    #[arg(short, long)]
    notes: Option<String>,

    /// Job location
    #[arg(long)]
    location: Option<String>,

    /// Salary (free text)
    #[arg(long)]
    salary: Option<String>,

    /// Job type (full-time, part-time, internship, remote, contract)
    #[arg(short = 'y', long = "type")]
    job_type: Option<JobType>,

    /// How you applied (company-website, linkedin, indeed, referral, email, other)
    #[arg(short, long)]
    method: Option<ApplicationMethod>,

    /// Follow-up date (YYYY-MM-DD)
    #[arg(short, long)]
    follow_up: Option<NaiveDate>,
}

impl DetailArgs {
    /// Overlays the flags that were given; an empty string clears a field.
    fn apply(self, form: &mut JobFormData) {
        overlay(&mut form.contact_person, self.contact);
        overlay(&mut form.contact_email, self.email);
        overlay(&mut form.notes, self.notes);
        overlay(&mut form.location, self.location);
        overlay(&mut form.salary, self.salary);
        if self.job_type.is_some() {
            form.job_type = self.job_type;
        }
        if self.method.is_some() {
            form.application_method = self.method;
        }
        if self.follow_up.is_some() {
            form.follow_up_date = self.follow_up;
        }
    }
}

fn overlay(field: &mut Option<String>, value: Option<String>) {
    if let Some(v) = value {
        *field = Some(v).filter(|s| !s.is_empty());
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    init_logging();

    let cli = Cli::parse();
    let config = Config::load(cli.db)?;
    let db = Database::open(&config.db_path)?;
    let clock = SystemClock;
    let notifier = ConsoleNotifier { quiet: cli.quiet };

    let mut tracker = Tracker::new(&db, &clock, &notifier);
    tracker.init()?;

    match cli.command {
        Commands::Init => {
            println!("Database ready at {}", db.path().display());
        }

        Commands::Login { email } => {
            let user = tracker.login(&email)?;
            println!("Logged in as {} ({} applications)", user.email, tracker.jobs.records().len());
        }

        Commands::Logout => {
            tracker.logout()?;
        }

        Commands::Whoami => match tracker.identity.current_identity() {
            Some(user) => {
                println!("{}", user.email);
                println!("ID: {}", user.id);
                println!("Since: {}", user.created_at.format("%Y-%m-%d %H:%M"));
            }
            None => println!("Not logged in."),
        },

        Commands::Add {
            title,
            company,
            date,
            status,
            details,
        } => {
            require_login(&tracker)?;
            let mut form = JobFormData::new(&title, &company, date.unwrap_or_else(|| clock.today()), status);
            details.apply(&mut form);
            let id = tracker.jobs.add(form)?;
            println!("Added job {}", id);
        }

        Commands::Edit {
            id,
            title,
            company,
            date,
            status,
            details,
        } => {
            require_login(&tracker)?;
            let existing = tracker
                .jobs
                .get(&id)
                .ok_or_else(|| anyhow!("Job {} not found", id))?;
            let mut form = existing.to_form();
            if let Some(title) = title {
                form.title = title;
            }
            if let Some(company) = company {
                form.company = company;
            }
            if let Some(date) = date {
                form.application_date = date;
            }
            if let Some(status) = status {
                form.status = status;
            }
            details.apply(&mut form);
            tracker.jobs.update(&id, form)?;
        }

        Commands::Delete { id } => {
            require_login(&tracker)?;
            if !tracker.jobs.delete(&id)? {
                println!("Job {} not found.", id);
            }
        }

        Commands::Show { id } => {
            require_login(&tracker)?;
            match tracker.jobs.get(&id) {
                Some(job) => print_job(job),
                None => println!("Job {} not found.", id),
            }
        }

        Commands::List { status, job_type } => {
            require_login(&tracker)?;
            let by_type = tracker.jobs.list_by_type(job_type);
            let jobs: Vec<_> = tracker
                .jobs
                .list_by_status(status)
                .into_iter()
                .filter(|job| by_type.iter().any(|t| t.id == job.id))
                .collect();
            if jobs.is_empty() {
                println!("No jobs found.");
            } else {
                println!("{:<10} {:<11} {:<28} {:<20} {:<10}", "ID", "STATUS", "TITLE", "COMPANY", "APPLIED");
                println!("{}", "-".repeat(83));
                for job in jobs {
                    println!(
                        "{:<10} {:<11} {:<28} {:<20} {:<10}",
                        short_id(&job.id),
                        job.status,
                        truncate(&job.title, 26),
                        truncate(&job.company, 18),
                        job.application_date
                    );
                }
            }
        }

        Commands::Board => {
            require_login(&tracker)?;
            for (status, jobs) in tracker.jobs.board() {
                println!("== {} ({})", status, jobs.len());
                if jobs.is_empty() {
                    println!("  No jobs in this status");
                }
                for job in jobs {
                    println!("  {} {} @ {}", short_id(&job.id), truncate(&job.title, 30), job.company);
                }
                println!();
            }
        }

        Commands::Stats { json } => {
            require_login(&tracker)?;
            let stats = stats::compute_statistics(tracker.jobs.records());
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                println!("Total applications: {}", stats.total_jobs);
                for (status, count) in &stats.status_counts {
                    println!("  {:<10} {}", status.label(), count);
                }
                println!("Companies: {}", stats.distinct_companies);
                match stats.average_response_time {
                    Some(days) => println!("Average response time: {} days", days),
                    None => println!("Average response time: n/a"),
                }
                if !stats.type_counts.is_empty() {
                    println!("\nBy job type:");
                    for (job_type, count) in &stats.type_counts {
                        println!("  {:<10} {}", job_type.label(), count);
                    }
                }
                if !stats.monthly_applications.is_empty() {
                    println!("\nBy month:");
                    for (month, count) in &stats.monthly_applications {
                        println!("  {} {:>4} {}", month, count, "#".repeat(*count));
                    }
                }
            }
        }

        Commands::Companies => {
            require_login(&tracker)?;
            let companies = tracker.jobs.popular_companies();
            if companies.is_empty() {
                println!("No companies yet.");
            }
            for company in companies {
                println!("{}", company);
            }
        }

        Commands::Search {
            keyword,
            location,
            radius,
            page,
            limit,
        } => {
            if !config.search.has_credentials() {
                eprintln!("Warning: RAPID_API_KEY is not set; the lookup will likely fail.");
            }
            let client = JobSearch::new(config.search.clone())?;
            let params = SearchParams {
                keyword,
                location,
                radius: Some(radius),
                page,
                limit,
            };
            let results = client.search(&params);
            if results.jobs.is_empty() {
                println!("No job listings found.");
            } else {
                let first = (results.current_page.saturating_sub(1) as u64) * limit as u64 + 1;
                let last = (results.current_page as u64 * limit as u64).min(results.total_results);
                println!("Showing {}-{} of {} results\n", first, last, results.total_results);
                for listing in &results.jobs {
                    println!("[{}] {}", listing.job_id, listing.job_title);
                    println!("    {} - {}", listing.employer_name, listing.location_name);
                    if let Some(salary) = &listing.salary {
                        println!("    Salary: {}", salary.describe());
                    }
                    println!("    Posted: {}", listing.posting_date);
                }
                println!("\nPage {} of {}", results.current_page, results.total_pages);
            }
        }

        Commands::Track { listing_id } => {
            require_login(&tracker)?;
            let client = JobSearch::new(config.search.clone())?;
            let listing = client
                .try_get_listing(&listing_id)
                .with_context(|| format!("Failed to fetch listing {}", listing_id))?;
            let id = search::track_listing(&mut tracker.jobs, &listing)?;
            println!("Tracking {} at {} as job {}", listing.job_title, listing.employer_name, id);
        }
    }

    Ok(())
}

fn require_login(tracker: &Tracker<'_>) -> Result<()> {
    if tracker.identity.current_identity().is_none() {
        return Err(anyhow!("Not logged in. Run 'jobtrack login <email>' first."));
    }
    Ok(())
}

fn print_job(job: &JobApplication) {
    println!("Job {}", job.id);
    println!("Title: {}", job.title);
    println!("Company: {}", job.company);
    println!("Status: {}", job.status);
    println!("Applied: {}", job.application_date);
    if let Some(location) = &job.location {
        println!("Location: {}", location);
    }
    if let Some(job_type) = job.job_type {
        println!("Type: {}", job_type);
    }
    if let Some(method) = job.application_method {
        println!("Applied via: {}", method);
    }
    if let Some(salary) = &job.salary {
        println!("Salary: {}", salary);
    }
    match (&job.contact_person, &job.contact_email) {
        (Some(name), Some(email)) => println!("Contact: {} <{}>", name, email),
        (Some(name), None) => println!("Contact: {}", name),
        (None, Some(email)) => println!("Contact: {}", email),
        (None, None) => {}
    }
    if let Some(follow_up) = job.follow_up_date {
        println!("Follow up: {}", follow_up);
    }
    println!("Created: {}", job.created_at.format("%Y-%m-%d %H:%M"));
    println!("Updated: {}", job.updated_at.format("%Y-%m-%d %H:%M"));
    if let Some(notes) = &job.notes {
        println!("\n--- Notes ---");
        for line in textwrap::wrap(notes, 80) {
            println!("{}", line);
        }
    }
}

fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}
