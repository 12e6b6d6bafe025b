use crate::Database;
use crate::models::{
    ApplicantApplicationRow, ApplicationRow, JobBriefRow, JobRow, SavedJobRow,
    SeekerApplicationRow, UserRow,
};
use anyhow::Result;
use rusqlite::Connection;
use rusqlite::types::ToSql;

const USER_COLS: &str = "id, email, password, full_name, role, avatar_url, bio, skills, cv_url, \
     phone, location, company_name, company_description, company_logo, company_website, \
     industry, company_size, created_at, updated_at";

const JOB_COLS: &str = "j.id, j.employer_id, j.title, j.description, j.requirements, j.job_type, \
     j.location, j.salary_min, j.salary_max, j.category, j.is_active, j.created_at, j.updated_at, \
     u.full_name, u.company_name, u.company_logo";

const APP_COLS: &str = "a.id, a.job_id, a.job_seeker_id, a.status, a.cover_letter, a.cv_url, \
     a.employer_notes, a.created_at, a.updated_at";

const SAVED_JOB_COLS: &str = "s.id, s.job_seeker_id, s.job_id, s.created_at, \
     j.id, j.title, j.location, j.salary_min, j.salary_max, u.company_name, u.company_logo";

pub struct NewUser<'a> {
    pub id: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub full_name: &'a str,
    pub role: &'a str,
}

/// Allow-listed profile fields; `None` means "leave unchanged". `skills`
/// arrives pre-encoded as a JSON array string.
#[derive(Default)]
pub struct ProfileChanges {
    pub full_name: Option<String>,
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
}

pub struct NewJob<'a> {
    pub id: &'a str,
    pub employer_id: &'a str,
    pub title: &'a str,
    pub description: &'a str,
    pub requirements: &'a str,
    pub job_type: &'a str,
    pub location: &'a str,
    pub salary_min: Option<i64>,
    pub salary_max: Option<i64>,
    pub category: Option<&'a str>,
    pub is_active: bool,
}

#[derive(Default)]
pub struct JobChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub requirements: Option<String>,
    pub job_type: Option<String>,
    pub location: Option<String>,
    pub salary_min: Option<i64>,
    pub salary_max: Option<i64>,
    pub category: Option<String>,
    pub is_active: Option<bool>,
}

/// Listing filters, combined with logical AND. Text filters are
/// case-insensitive substring matches; `job_type` is an exact match.
#[derive(Default)]
pub struct JobFilters {
    pub title: Option<String>,
    pub location: Option<String>,
    pub job_type: Option<String>,
    pub category: Option<String>,
    pub salary_min: Option<i64>,
}

impl Database {
    // -- Users --

    pub fn create_user(&self, user: &NewUser) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, email, password, full_name, role)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                (user.id, user.email, user.password_hash, user.full_name, user.role),
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare(&format!("SELECT {USER_COLS} FROM users WHERE email = ?1"))?;
            stmt.query_row([email], map_user_row).optional()
        })
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!("SELECT {USER_COLS} FROM users WHERE id = ?1"))?;
            stmt.query_row([id], map_user_row).optional()
        })
    }

    /// Partial update of the caller's own profile. Returns false when no
    /// such user exists. A request with nothing to change is a no-op.
    pub fn update_user_profile(&self, id: &str, changes: &ProfileChanges) -> Result<bool> {
        let mut sets: Vec<&'static str> = Vec::new();
        let mut params: Vec<&dyn ToSql> = Vec::new();

        macro_rules! push_field {
            ($col:literal, $field:expr) => {
                if let Some(v) = &$field {
                    sets.push(concat!($col, " = ?"));
                    params.push(v as &dyn ToSql);
                }
            };
        }

        push_field!("full_name", changes.full_name);
        push_field!("avatar_url", changes.avatar_url);
        push_field!("bio", changes.bio);
        push_field!("skills", changes.skills);
        push_field!("cv_url", changes.cv_url);
        push_field!("phone", changes.phone);
        push_field!("location", changes.location);
        push_field!("company_name", changes.company_name);
        push_field!("company_description", changes.company_description);
        push_field!("company_logo", changes.company_logo);
        push_field!("company_website", changes.company_website);
        push_field!("industry", changes.industry);
        push_field!("company_size", changes.company_size);

        if sets.is_empty() {
            return Ok(self.get_user_by_id(id)?.is_some());
        }

        params.push(&id);
        let sql = format!(
            "UPDATE users SET {}, updated_at = datetime('now') WHERE id = ?",
            sets.join(", ")
        );

        self.with_conn(|conn| {
            let n = conn.execute(&sql, params.as_slice())?;
            Ok(n > 0)
        })
    }

    /// Public job-seeker directory. `skills` matches any of the requested
    /// skills against the stored JSON array.
    pub fn search_job_seekers(
        &self,
        skills: &[String],
        location: Option<&str>,
        page: u32,
        limit: u32,
    ) -> Result<(Vec<UserRow>, u32)> {
        let mut clauses = vec!["role = 'job_seeker'".to_string()];
        let mut params: Vec<Box<dyn ToSql>> = Vec::new();

        if !skills.is_empty() {
            let mut any = Vec::new();
            for skill in skills {
                any.push("instr(lower(ifnull(skills, '')), ?) > 0".to_string());
                params.push(Box::new(skill.to_lowercase()));
            }
            clauses.push(format!("({})", any.join(" OR ")));
        }
        if let Some(loc) = location {
            clauses.push("instr(lower(ifnull(location, '')), ?) > 0".to_string());
            params.push(Box::new(loc.to_lowercase()));
        }

        self.search_users(&clauses, params, page, limit)
    }

    /// Public employer directory.
    pub fn search_employers(
        &self,
        industry: Option<&str>,
        location: Option<&str>,
        page: u32,
        limit: u32,
    ) -> Result<(Vec<UserRow>, u32)> {
        let mut clauses = vec!["role = 'employer'".to_string()];
        let mut params: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(ind) = industry {
            clauses.push("instr(lower(ifnull(industry, '')), ?) > 0".to_string());
            params.push(Box::new(ind.to_lowercase()));
        }
        if let Some(loc) = location {
            clauses.push("instr(lower(ifnull(location, '')), ?) > 0".to_string());
            params.push(Box::new(loc.to_lowercase()));
        }

        self.search_users(&clauses, params, page, limit)
    }

    fn search_users(
        &self,
        clauses: &[String],
        mut params: Vec<Box<dyn ToSql>>,
        page: u32,
        limit: u32,
    ) -> Result<(Vec<UserRow>, u32)> {
        let where_sql = clauses.join(" AND ");

        self.with_conn(|conn| {
            let count_sql = format!("SELECT COUNT(*) FROM users WHERE {where_sql}");
            let refs: Vec<&dyn ToSql> = params.iter().map(|p| p.as_ref()).collect();
            let total: i64 = conn.query_row(&count_sql, refs.as_slice(), |row| row.get(0))?;

            params.push(Box::new(limit as i64));
            params.push(Box::new(page_offset(page, limit)));
            let refs: Vec<&dyn ToSql> = params.iter().map(|p| p.as_ref()).collect();

            let sql = format!(
                "SELECT {USER_COLS} FROM users WHERE {where_sql}
                 ORDER BY created_at DESC LIMIT ? OFFSET ?"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(refs.as_slice(), map_user_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok((rows, total as u32))
        })
    }

    // -- Jobs --

    pub fn insert_job(&self, job: &NewJob) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO jobs (id, employer_id, title, description, requirements, job_type,
                                   location, salary_min, salary_max, category, is_active)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                rusqlite::params![
                    job.id,
                    job.employer_id,
                    job.title,
                    job.description,
                    job.requirements,
                    job.job_type,
                    job.location,
                    job.salary_min,
                    job.salary_max,
                    job.category,
                    job.is_active,
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_job(&self, id: &str) -> Result<Option<JobRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {JOB_COLS} FROM jobs j
                 LEFT JOIN users u ON j.employer_id = u.id
                 WHERE j.id = ?1"
            ))?;
            stmt.query_row([id], map_job_row).optional()
        })
    }

    /// Active-job listing with ANDed filters and page/limit pagination.
    /// Returns the page of rows plus the total match count.
    pub fn search_jobs(
        &self,
        filters: &JobFilters,
        page: u32,
        limit: u32,
    ) -> Result<(Vec<JobRow>, u32)> {
        let mut clauses = vec!["j.is_active = 1".to_string()];
        let mut params: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(title) = &filters.title {
            clauses.push("instr(lower(j.title), ?) > 0".to_string());
            params.push(Box::new(title.to_lowercase()));
        }
        if let Some(location) = &filters.location {
            clauses.push("instr(lower(j.location), ?) > 0".to_string());
            params.push(Box::new(location.to_lowercase()));
        }
        if let Some(job_type) = &filters.job_type {
            clauses.push("j.job_type = ?".to_string());
            params.push(Box::new(job_type.clone()));
        }
        if let Some(category) = &filters.category {
            clauses.push("instr(lower(ifnull(j.category, '')), ?) > 0".to_string());
            params.push(Box::new(category.to_lowercase()));
        }
        if let Some(salary_min) = filters.salary_min {
            clauses.push("j.salary_min >= ?".to_string());
            params.push(Box::new(salary_min));
        }

        let where_sql = clauses.join(" AND ");

        self.with_conn(|conn| {
            let count_sql = format!("SELECT COUNT(*) FROM jobs j WHERE {where_sql}");
            let refs: Vec<&dyn ToSql> = params.iter().map(|p| p.as_ref()).collect();
            let total: i64 = conn.query_row(&count_sql, refs.as_slice(), |row| row.get(0))?;

            params.push(Box::new(limit as i64));
            params.push(Box::new(page_offset(page, limit)));
            let refs: Vec<&dyn ToSql> = params.iter().map(|p| p.as_ref()).collect();

            let sql = format!(
                "SELECT {JOB_COLS} FROM jobs j
                 LEFT JOIN users u ON j.employer_id = u.id
                 WHERE {where_sql}
                 ORDER BY j.created_at DESC LIMIT ? OFFSET ?"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(refs.as_slice(), map_job_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok((rows, total as u32))
        })
    }

    /// All jobs for one employer, inactive included, newest first.
    pub fn jobs_by_employer(&self, employer_id: &str) -> Result<Vec<JobRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {JOB_COLS} FROM jobs j
                 LEFT JOIN users u ON j.employer_id = u.id
                 WHERE j.employer_id = ?1
                 ORDER BY j.created_at DESC"
            ))?;
            let rows = stmt
                .query_map([employer_id], map_job_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Owner-scoped partial update: touches zero rows unless the job exists
    /// AND belongs to `employer_id`. Returns false in that case so the
    /// handler can answer with the merged not-found/unauthorized error.
    pub fn update_job(&self, id: &str, employer_id: &str, changes: &JobChanges) -> Result<bool> {
        let mut sets: Vec<&'static str> = Vec::new();
        let mut params: Vec<&dyn ToSql> = Vec::new();

        macro_rules! push_field {
            ($col:literal, $field:expr) => {
                if let Some(v) = &$field {
                    sets.push(concat!($col, " = ?"));
                    params.push(v as &dyn ToSql);
                }
            };
        }

        push_field!("title", changes.title);
        push_field!("description", changes.description);
        push_field!("requirements", changes.requirements);
        push_field!("job_type", changes.job_type);
        push_field!("location", changes.location);
        push_field!("salary_min", changes.salary_min);
        push_field!("salary_max", changes.salary_max);
        push_field!("category", changes.category);
        push_field!("is_active", changes.is_active);

        if sets.is_empty() {
            return self.with_conn(|conn| {
                let n: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM jobs WHERE id = ?1 AND employer_id = ?2",
                    [id, employer_id],
                    |row| row.get(0),
                )?;
                Ok(n > 0)
            });
        }

        params.push(&id);
        params.push(&employer_id);
        let sql = format!(
            "UPDATE jobs SET {}, updated_at = datetime('now')
             WHERE id = ? AND employer_id = ?",
            sets.join(", ")
        );

        self.with_conn(|conn| {
            let n = conn.execute(&sql, params.as_slice())?;
            Ok(n > 0)
        })
    }

    pub fn delete_job(&self, id: &str, employer_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "DELETE FROM jobs WHERE id = ?1 AND employer_id = ?2",
                [id, employer_id],
            )?;
            Ok(n > 0)
        })
    }

    // -- Applications --

    /// The UNIQUE(job_id, job_seeker_id) constraint makes concurrent
    /// double-applies lose cleanly; callers translate the violation with
    /// `crate::is_unique_violation`.
    pub fn insert_application(
        &self,
        id: &str,
        job_id: &str,
        job_seeker_id: &str,
        cover_letter: &str,
        cv_url: &str,
    ) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO applications (id, job_id, job_seeker_id, cover_letter, cv_url)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                (id, job_id, job_seeker_id, cover_letter, cv_url),
            )?;
            Ok(())
        })
    }

    pub fn get_application(&self, id: &str) -> Result<Option<ApplicationRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {APP_COLS} FROM applications a WHERE a.id = ?1"
            ))?;
            stmt.query_row([id], map_application_row).optional()
        })
    }

    /// Resolve the employer who owns the job an application points at.
    /// Fails closed: `None` when either the application or its job is gone,
    /// and callers must treat `None` as unauthorized.
    pub fn resolve_job_owner(&self, application_id: &str) -> Result<Option<String>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT j.employer_id FROM applications a
                 JOIN jobs j ON a.job_id = j.id
                 WHERE a.id = ?1",
                [application_id],
                |row| row.get(0),
            )
            .optional()
        })
    }

    pub fn applications_by_seeker(&self, job_seeker_id: &str) -> Result<Vec<SeekerApplicationRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {APP_COLS}, j.id, j.title, j.location, j.salary_min, j.salary_max,
                        u.company_name, u.company_logo
                 FROM applications a
                 LEFT JOIN jobs j ON a.job_id = j.id
                 LEFT JOIN users u ON j.employer_id = u.id
                 WHERE a.job_seeker_id = ?1
                 ORDER BY a.created_at DESC"
            ))?;
            let rows = stmt
                .query_map([job_seeker_id], |row| {
                    let app = map_application_row(row)?;
                    let job = match row.get::<_, Option<String>>(9)? {
                        Some(job_id) => Some(JobBriefRow {
                            id: job_id,
                            title: row.get(10)?,
                            location: row.get(11)?,
                            salary_min: row.get(12)?,
                            salary_max: row.get(13)?,
                            company_name: row.get(14)?,
                            company_logo: row.get(15)?,
                        }),
                        None => None,
                    };
                    Ok(SeekerApplicationRow { app, job })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn applications_for_job(&self, job_id: &str) -> Result<Vec<ApplicantApplicationRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {APP_COLS}, u.full_name, u.email, u.bio, u.skills, u.phone,
                        u.location, u.cv_url, u.avatar_url
                 FROM applications a
                 JOIN users u ON a.job_seeker_id = u.id
                 WHERE a.job_id = ?1
                 ORDER BY a.created_at DESC"
            ))?;
            let rows = stmt
                .query_map([job_id], |row| {
                    Ok(ApplicantApplicationRow {
                        app: map_application_row(row)?,
                        full_name: row.get(9)?,
                        email: row.get(10)?,
                        bio: row.get(11)?,
                        skills: row.get(12)?,
                        phone: row.get(13)?,
                        location: row.get(14)?,
                        cv_url: row.get(15)?,
                        avatar_url: row.get(16)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn set_application_status(&self, id: &str, status: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE applications SET status = ?1, updated_at = datetime('now') WHERE id = ?2",
                [status, id],
            )?;
            Ok(n > 0)
        })
    }

    pub fn set_application_note(&self, id: &str, note: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE applications SET employer_notes = ?1, updated_at = datetime('now')
                 WHERE id = ?2",
                [note, id],
            )?;
            Ok(n > 0)
        })
    }

    pub fn update_application_content(
        &self,
        id: &str,
        cover_letter: &str,
        cv_url: &str,
    ) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "UPDATE applications SET cover_letter = ?1, cv_url = ?2,
                        updated_at = datetime('now')
                 WHERE id = ?3",
                [cover_letter, cv_url, id],
            )?;
            Ok(n > 0)
        })
    }

    pub fn delete_application(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute("DELETE FROM applications WHERE id = ?1", [id])?;
            Ok(n > 0)
        })
    }

    // -- Saved jobs --

    /// UNIQUE(job_seeker_id, job_id) backs the one-bookmark-per-job rule.
    pub fn insert_saved_job(&self, id: &str, job_seeker_id: &str, job_id: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO saved_jobs (id, job_seeker_id, job_id) VALUES (?1, ?2, ?3)",
                (id, job_seeker_id, job_id),
            )?;
            Ok(())
        })
    }

    pub fn saved_jobs_by_seeker(&self, job_seeker_id: &str) -> Result<Vec<SavedJobRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SAVED_JOB_COLS}
                 FROM saved_jobs s
                 LEFT JOIN jobs j ON s.job_id = j.id
                 LEFT JOIN users u ON j.employer_id = u.id
                 WHERE s.job_seeker_id = ?1
                 ORDER BY s.created_at DESC"
            ))?;
            let rows = stmt
                .query_map([job_seeker_id], map_saved_job_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_saved_job(&self, id: &str) -> Result<Option<SavedJobRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!(
                    "SELECT {SAVED_JOB_COLS}
                     FROM saved_jobs s
                     LEFT JOIN jobs j ON s.job_id = j.id
                     LEFT JOIN users u ON j.employer_id = u.id
                     WHERE s.id = ?1"
                ),
                [id],
                map_saved_job_row,
            )
            .optional()
        })
    }

    pub fn is_job_saved(&self, job_seeker_id: &str, job_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let n: i64 = conn.query_row(
                "SELECT COUNT(*) FROM saved_jobs WHERE job_seeker_id = ?1 AND job_id = ?2",
                [job_seeker_id, job_id],
                |row| row.get(0),
            )?;
            Ok(n > 0)
        })
    }

    pub fn delete_saved_job(&self, job_seeker_id: &str, job_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let n = conn.execute(
                "DELETE FROM saved_jobs WHERE job_seeker_id = ?1 AND job_id = ?2",
                [job_seeker_id, job_id],
            )?;
            Ok(n > 0)
        })
    }
}

fn page_offset(page: u32, limit: u32) -> i64 {
    (page.saturating_sub(1) as i64) * (limit as i64)
}

fn map_saved_job_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<SavedJobRow> {
    let job = match row.get::<_, Option<String>>(4)? {
        Some(job_id) => Some(JobBriefRow {
            id: job_id,
            title: row.get(5)?,
            location: row.get(6)?,
            salary_min: row.get(7)?,
            salary_max: row.get(8)?,
            company_name: row.get(9)?,
            company_logo: row.get(10)?,
        }),
        None => None,
    };
    Ok(SavedJobRow {
        id: row.get(0)?,
        job_seeker_id: row.get(1)?,
        job_id: row.get(2)?,
        created_at: row.get(3)?,
        job,
    })
}

fn map_user_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        email: row.get(1)?,
        password: row.get(2)?,
        full_name: row.get(3)?,
        role: row.get(4)?,
        avatar_url: row.get(5)?,
        bio: row.get(6)?,
        skills: row.get(7)?,
        cv_url: row.get(8)?,
        phone: row.get(9)?,
        location: row.get(10)?,
        company_name: row.get(11)?,
        company_description: row.get(12)?,
        company_logo: row.get(13)?,
        company_website: row.get(14)?,
        industry: row.get(15)?,
        company_size: row.get(16)?,
        created_at: row.get(17)?,
        updated_at: row.get(18)?,
    })
}

fn map_job_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<JobRow> {
    Ok(JobRow {
        id: row.get(0)?,
        employer_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        requirements: row.get(4)?,
        job_type: row.get(5)?,
        location: row.get(6)?,
        salary_min: row.get(7)?,
        salary_max: row.get(8)?,
        category: row.get(9)?,
        is_active: row.get(10)?,
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
        employer_name: row.get(13)?,
        company_name: row.get(14)?,
        company_logo: row.get(15)?,
    })
}

fn map_application_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ApplicationRow> {
    Ok(ApplicationRow {
        id: row.get(0)?,
        job_id: row.get(1)?,
        job_seeker_id: row.get(2)?,
        status: row.get(3)?,
        cover_letter: row.get(4)?,
        cv_url: row.get(5)?,
        employer_notes: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::is_unique_violation;

    fn test_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn add_user(db: &Database, id: &str, email: &str, role: &str) {
        db.create_user(&NewUser {
            id,
            email,
            password_hash: "x",
            full_name: "Test User",
            role,
        })
        .unwrap();
    }

    fn add_job(db: &Database, id: &str, employer_id: &str, title: &str, location: &str) {
        db.insert_job(&NewJob {
            id,
            employer_id,
            title,
            description: "desc",
            requirements: "[]",
            job_type: "full_time",
            location,
            salary_min: Some(50_000),
            salary_max: Some(90_000),
            category: Some("engineering"),
            is_active: true,
        })
        .unwrap();
    }

    #[test]
    fn duplicate_application_rejected_by_constraint() {
        let db = test_db();
        add_user(&db, "emp", "emp@x.com", "employer");
        add_user(&db, "seek", "seek@x.com", "job_seeker");
        add_job(&db, "job", "emp", "Backend Engineer", "Nairobi");

        db.insert_application("a1", "job", "seek", "hi", "http://cv").unwrap();
        let err = db
            .insert_application("a2", "job", "seek", "hi again", "http://cv")
            .unwrap_err();
        assert!(is_unique_violation(&err));

        // the losing write left nothing behind
        let apps = db.applications_by_seeker("seek").unwrap();
        assert_eq!(apps.len(), 1);
        assert_eq!(apps[0].app.id, "a1");
    }

    #[test]
    fn search_excludes_inactive_and_filters_by_location() {
        let db = test_db();
        add_user(&db, "emp", "emp@x.com", "employer");
        add_job(&db, "j1", "emp", "Backend Engineer", "Nairobi, Kenya");
        add_job(&db, "j2", "emp", "Frontend Engineer", "Dar es Salaam");
        add_job(&db, "j3", "emp", "Data Engineer", "NAIROBI CBD");
        db.update_job(
            "j3",
            "emp",
            &JobChanges {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .unwrap();

        let filters = JobFilters {
            location: Some("nairobi".into()),
            ..Default::default()
        };
        let (rows, total) = db.search_jobs(&filters, 1, 10).unwrap();
        assert_eq!(total, 1);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, "j1");

        // no filter still hides the deactivated job
        let (_, total) = db.search_jobs(&JobFilters::default(), 1, 10).unwrap();
        assert_eq!(total, 2);
    }

    #[test]
    fn employer_job_listing_keeps_inactive_jobs() {
        let db = test_db();
        add_user(&db, "emp", "emp@x.com", "employer");
        add_user(&db, "other", "other@x.com", "employer");
        add_job(&db, "j1", "emp", "Engineer", "Nairobi");
        add_job(&db, "j2", "emp", "Designer", "Nairobi");
        add_job(&db, "j3", "other", "Analyst", "Mombasa");
        db.update_job(
            "j2",
            "emp",
            &JobChanges {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .unwrap();

        let jobs = db.jobs_by_employer("emp").unwrap();
        let ids: Vec<&str> = jobs.iter().map(|j| j.id.as_str()).collect();
        assert_eq!(jobs.len(), 2);
        assert!(ids.contains(&"j1") && ids.contains(&"j2"));
    }

    #[test]
    fn search_pagination_counts_all_matches() {
        let db = test_db();
        add_user(&db, "emp", "emp@x.com", "employer");
        for i in 0..25 {
            add_job(&db, &format!("j{i}"), "emp", "Engineer", "Remote");
        }

        let (rows, total) = db.search_jobs(&JobFilters::default(), 3, 10).unwrap();
        assert_eq!(total, 25);
        assert_eq!(rows.len(), 5);
    }

    #[test]
    fn search_salary_floor_and_job_type() {
        let db = test_db();
        add_user(&db, "emp", "emp@x.com", "employer");
        add_job(&db, "j1", "emp", "Engineer", "Remote");
        db.insert_job(&NewJob {
            id: "j2",
            employer_id: "emp",
            title: "Intern",
            description: "desc",
            requirements: "[]",
            job_type: "internship",
            location: "Remote",
            salary_min: Some(10_000),
            salary_max: None,
            category: None,
            is_active: true,
        })
        .unwrap();

        let filters = JobFilters {
            salary_min: Some(40_000),
            ..Default::default()
        };
        let (rows, _) = db.search_jobs(&filters, 1, 10).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, "j1");

        let filters = JobFilters {
            job_type: Some("internship".into()),
            ..Default::default()
        };
        let (rows, _) = db.search_jobs(&filters, 1, 10).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, "j2");
    }

    #[test]
    fn owner_scoped_job_update_ignores_non_owner() {
        let db = test_db();
        add_user(&db, "emp1", "a@x.com", "employer");
        add_user(&db, "emp2", "b@x.com", "employer");
        add_job(&db, "job", "emp1", "Engineer", "Remote");

        let changes = JobChanges {
            title: Some("Hijacked".into()),
            ..Default::default()
        };
        assert!(!db.update_job("job", "emp2", &changes).unwrap());
        assert!(!db.delete_job("job", "emp2").unwrap());
        assert_eq!(db.get_job("job").unwrap().unwrap().title, "Engineer");

        assert!(db.update_job("job", "emp1", &changes).unwrap());
        assert_eq!(db.get_job("job").unwrap().unwrap().title, "Hijacked");
    }

    #[test]
    fn resolve_job_owner_fails_closed_when_job_deleted() {
        let db = test_db();
        add_user(&db, "emp", "emp@x.com", "employer");
        add_user(&db, "seek", "seek@x.com", "job_seeker");
        add_job(&db, "job", "emp", "Engineer", "Remote");
        db.insert_application("app", "job", "seek", "hi", "http://cv").unwrap();

        assert_eq!(db.resolve_job_owner("app").unwrap(), Some("emp".to_string()));

        db.delete_job("job", "emp").unwrap();
        assert_eq!(db.resolve_job_owner("app").unwrap(), None);

        // application itself missing resolves the same way
        assert_eq!(db.resolve_job_owner("nope").unwrap(), None);
    }

    #[test]
    fn seeker_listing_survives_deleted_job() {
        let db = test_db();
        add_user(&db, "emp", "emp@x.com", "employer");
        add_user(&db, "seek", "seek@x.com", "job_seeker");
        add_job(&db, "job", "emp", "Engineer", "Remote");
        db.insert_application("app", "job", "seek", "hi", "http://cv").unwrap();
        db.delete_job("job", "emp").unwrap();

        let apps = db.applications_by_seeker("seek").unwrap();
        assert_eq!(apps.len(), 1);
        assert!(apps[0].job.is_none());
    }

    #[test]
    fn saved_job_unique_per_seeker_and_job() {
        let db = test_db();
        add_user(&db, "emp", "emp@x.com", "employer");
        add_user(&db, "seek", "seek@x.com", "job_seeker");
        add_job(&db, "job", "emp", "Engineer", "Remote");

        db.insert_saved_job("s1", "seek", "job").unwrap();
        let err = db.insert_saved_job("s2", "seek", "job").unwrap_err();
        assert!(is_unique_violation(&err));

        assert!(db.is_job_saved("seek", "job").unwrap());
        assert!(db.delete_saved_job("seek", "job").unwrap());
        assert!(!db.is_job_saved("seek", "job").unwrap());
        assert!(!db.delete_saved_job("seek", "job").unwrap());
    }

    #[test]
    fn duplicate_email_rejected() {
        let db = test_db();
        add_user(&db, "u1", "dup@x.com", "job_seeker");
        let err = db
            .create_user(&NewUser {
                id: "u2",
                email: "dup@x.com",
                password_hash: "x",
                full_name: "Other",
                role: "employer",
            })
            .unwrap_err();
        assert!(is_unique_violation(&err));
    }

    #[test]
    fn profile_update_is_partial_and_scoped() {
        let db = test_db();
        add_user(&db, "u1", "a@x.com", "job_seeker");

        let changes = ProfileChanges {
            bio: Some("Rustacean".into()),
            skills: Some(r#"["rust","sql"]"#.into()),
            ..Default::default()
        };
        assert!(db.update_user_profile("u1", &changes).unwrap());
        let user = db.get_user_by_id("u1").unwrap().unwrap();
        assert_eq!(user.bio.as_deref(), Some("Rustacean"));
        assert_eq!(user.full_name, "Test User");

        assert!(!db.update_user_profile("ghost", &changes).unwrap());
    }

    #[test]
    fn seeker_directory_matches_any_skill() {
        let db = test_db();
        add_user(&db, "u1", "a@x.com", "job_seeker");
        add_user(&db, "u2", "b@x.com", "job_seeker");
        add_user(&db, "emp", "c@x.com", "employer");
        db.update_user_profile(
            "u1",
            &ProfileChanges {
                skills: Some(r#"["Rust","SQL"]"#.into()),
                ..Default::default()
            },
        )
        .unwrap();

        let (rows, total) = db
            .search_job_seekers(&["rust".into(), "go".into()], None, 1, 10)
            .unwrap();
        assert_eq!(total, 1);
        assert_eq!(rows[0].id, "u1");

        // employer accounts never appear in the seeker directory
        let (rows, _) = db.search_job_seekers(&[], None, 1, 10).unwrap();
        assert_eq!(rows.len(), 2);
    }
}
