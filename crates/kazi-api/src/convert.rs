//! Row-to-wire conversions shared by the handler modules. Stored enum text
//! and timestamps are guarded by schema CHECK constraints, so parse failures
//! here mean a corrupt database; they are logged and defaulted rather than
//! failing the whole response.

use chrono::{DateTime, Utc};
use tracing::warn;
use uuid::Uuid;

use kazi_db::models::{ApplicationRow, JobBriefRow, JobRow, UserRow};
use kazi_types::api::{
    ApplicationResponse, EmployerSummary, JobResponse, JobSummary, UserResponse,
};
use kazi_types::models::{ApplicationStatus, JobType, Role};

pub(crate) fn parse_uuid(s: &str, what: &str) -> Uuid {
    s.parse().unwrap_or_else(|e| {
        warn!("Corrupt {} id '{}': {}", what, s, e);
        Uuid::default()
    })
}

pub(crate) fn parse_ts(s: &str) -> DateTime<Utc> {
    s.parse::<DateTime<Utc>>()
        .or_else(|_| {
            // SQLite stores timestamps as "YYYY-MM-DD HH:MM:SS" without timezone.
            // Parse as naive UTC and convert.
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}': {}", s, e);
            DateTime::default()
        })
}

fn parse_string_list(s: &str) -> Vec<String> {
    serde_json::from_str(s).unwrap_or_else(|e| {
        warn!("Corrupt JSON list '{}': {}", s, e);
        Vec::new()
    })
}

pub(crate) fn parse_string_list_opt(s: Option<&str>) -> Option<Vec<String>> {
    s.map(parse_string_list)
}

/// `include_email` distinguishes the caller's own profile from the public
/// view; the password hash is dropped in both.
pub(crate) fn user_response(row: UserRow, include_email: bool) -> UserResponse {
    let role = row.role.parse::<Role>().unwrap_or_else(|e| {
        warn!("Corrupt role on user '{}': {}", row.id, e);
        Role::JobSeeker
    });

    UserResponse {
        id: parse_uuid(&row.id, "user"),
        email: include_email.then_some(row.email),
        full_name: row.full_name,
        role,
        avatar_url: row.avatar_url,
        bio: row.bio,
        skills: row.skills.as_deref().map(parse_string_list),
        cv_url: row.cv_url,
        phone: row.phone,
        location: row.location,
        company_name: row.company_name,
        company_description: row.company_description,
        company_logo: row.company_logo,
        company_website: row.company_website,
        industry: row.industry,
        company_size: row.company_size,
        created_at: parse_ts(&row.created_at),
    }
}

/// Full company block for the single-job view, built from the employer's
/// user record.
pub(crate) fn employer_detail(row: &UserRow) -> EmployerSummary {
    EmployerSummary {
        full_name: row.full_name.clone(),
        company_name: row.company_name.clone(),
        company_logo: row.company_logo.clone(),
        company_description: row.company_description.clone(),
        company_website: row.company_website.clone(),
        industry: row.industry.clone(),
        company_size: row.company_size.clone(),
    }
}

pub(crate) fn job_response(row: JobRow) -> JobResponse {
    let job_type = row.job_type.parse::<JobType>().unwrap_or_else(|e| {
        warn!("Corrupt job_type on job '{}': {}", row.id, e);
        JobType::FullTime
    });

    let employer = row.employer_name.map(|full_name| EmployerSummary {
        full_name,
        company_name: row.company_name,
        company_logo: row.company_logo,
        company_description: None,
        company_website: None,
        industry: None,
        company_size: None,
    });

    JobResponse {
        id: parse_uuid(&row.id, "job"),
        employer_id: parse_uuid(&row.employer_id, "employer"),
        title: row.title,
        description: row.description,
        requirements: parse_string_list(&row.requirements),
        job_type,
        location: row.location,
        salary_min: row.salary_min,
        salary_max: row.salary_max,
        category: row.category,
        is_active: row.is_active,
        employer,
        created_at: parse_ts(&row.created_at),
        updated_at: parse_ts(&row.updated_at),
    }
}

pub(crate) fn job_summary(row: JobBriefRow) -> JobSummary {
    JobSummary {
        id: parse_uuid(&row.id, "job"),
        title: row.title,
        location: row.location,
        salary_min: row.salary_min,
        salary_max: row.salary_max,
        company_name: row.company_name,
        company_logo: row.company_logo,
    }
}

pub(crate) fn application_response(row: ApplicationRow) -> ApplicationResponse {
    let status = row.status.parse::<ApplicationStatus>().unwrap_or_else(|e| {
        warn!("Corrupt status on application '{}': {}", row.id, e);
        ApplicationStatus::Pending
    });

    ApplicationResponse {
        id: parse_uuid(&row.id, "application"),
        job_id: parse_uuid(&row.job_id, "job"),
        job_seeker_id: parse_uuid(&row.job_seeker_id, "job seeker"),
        status,
        cover_letter: row.cover_letter,
        cv_url: row.cv_url,
        employer_notes: row.employer_notes,
        job: None,
        applicant: None,
        created_at: parse_ts(&row.created_at),
        updated_at: parse_ts(&row.updated_at),
    }
}
