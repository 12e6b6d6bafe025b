/// Database row types mapping directly to SQLite rows.
/// Distinct from the kazi-types API models to keep the DB layer independent.
/// Enum-ish columns (role, job_type, status) stay as text here and are
/// parsed at the API boundary; `skills`/`requirements` hold JSON arrays.

pub struct UserRow {
    pub id: String,
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub role: String,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub skills: Option<String>,
    pub cv_url: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub company_name: Option<String>,
    pub company_description: Option<String>,
    pub company_logo: Option<String>,
    pub company_website: Option<String>,
    pub industry: Option<String>,
    pub company_size: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

pub struct JobRow {
    pub id: String,
    pub employer_id: String,
    pub title: String,
    pub description: String,
    pub requirements: String,
    pub job_type: String,
    pub location: String,
    pub salary_min: Option<i64>,
    pub salary_max: Option<i64>,
    pub category: Option<String>,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
    // Employer display fields, joined in every job SELECT. NULL when the
    // owning account has been removed out-of-band.
    pub employer_name: Option<String>,
    pub company_name: Option<String>,
    pub company_logo: Option<String>,
}

pub struct ApplicationRow {
    pub id: String,
    pub job_id: String,
    pub job_seeker_id: String,
    pub status: String,
    pub cover_letter: String,
    pub cv_url: String,
    pub employer_notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Short job block joined onto a seeker's application and bookmark listings.
pub struct JobBriefRow {
    pub id: String,
    pub title: String,
    pub location: String,
    pub salary_min: Option<i64>,
    pub salary_max: Option<i64>,
    pub company_name: Option<String>,
    pub company_logo: Option<String>,
}

/// Seeker view of one of their applications; `job` is None when the posting
/// has since been deleted.
pub struct SeekerApplicationRow {
    pub app: ApplicationRow,
    pub job: Option<JobBriefRow>,
}

/// Employer view of an applicant: the application plus the seeker's profile.
pub struct ApplicantApplicationRow {
    pub app: ApplicationRow,
    pub full_name: String,
    pub email: String,
    pub bio: Option<String>,
    pub skills: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub cv_url: Option<String>,
    pub avatar_url: Option<String>,
}

pub struct SavedJobRow {
    pub id: String,
    pub job_seeker_id: String,
    pub job_id: String,
    pub created_at: String,
    pub job: Option<JobBriefRow>,
}
