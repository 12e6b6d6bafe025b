use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

/// Cross-table references are plain id columns, checked at write time by the
/// handlers rather than enforced here: a job may be deleted while
/// applications still point at it, and the owner-resolution queries treat
/// the dangling reference as unauthorized.
pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id                  TEXT PRIMARY KEY,
            email               TEXT NOT NULL UNIQUE,
            password            TEXT NOT NULL,
            full_name           TEXT NOT NULL,
            role                TEXT NOT NULL
                                CHECK (role IN ('job_seeker', 'employer', 'admin')),
            avatar_url          TEXT,
            -- job seeker fields
            bio                 TEXT,
            skills              TEXT, -- JSON array of strings
            cv_url              TEXT,
            phone               TEXT,
            location            TEXT,
            -- employer fields
            company_name        TEXT,
            company_description TEXT,
            company_logo        TEXT,
            company_website     TEXT,
            industry            TEXT,
            company_size        TEXT,
            created_at          TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at          TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS jobs (
            id              TEXT PRIMARY KEY,
            employer_id     TEXT NOT NULL,
            title           TEXT NOT NULL,
            description     TEXT NOT NULL,
            requirements    TEXT NOT NULL DEFAULT '[]', -- JSON array of strings
            job_type        TEXT NOT NULL
                            CHECK (job_type IN ('full_time', 'part_time', 'contract', 'internship')),
            location        TEXT NOT NULL,
            salary_min      INTEGER,
            salary_max      INTEGER,
            category        TEXT,
            is_active       INTEGER NOT NULL DEFAULT 1,
            created_at      TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at      TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_jobs_employer
            ON jobs(employer_id);
        CREATE INDEX IF NOT EXISTS idx_jobs_active_created
            ON jobs(is_active, created_at);

        CREATE TABLE IF NOT EXISTS applications (
            id              TEXT PRIMARY KEY,
            job_id          TEXT NOT NULL,
            job_seeker_id   TEXT NOT NULL,
            status          TEXT NOT NULL DEFAULT 'pending'
                            CHECK (status IN ('pending', 'reviewed', 'accepted', 'rejected')),
            cover_letter    TEXT NOT NULL,
            cv_url          TEXT NOT NULL,
            employer_notes  TEXT,
            created_at      TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at      TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(job_id, job_seeker_id)
        );

        CREATE INDEX IF NOT EXISTS idx_applications_job
            ON applications(job_id);
        CREATE INDEX IF NOT EXISTS idx_applications_seeker
            ON applications(job_seeker_id);

        CREATE TABLE IF NOT EXISTS saved_jobs (
            id              TEXT PRIMARY KEY,
            job_seeker_id   TEXT NOT NULL,
            job_id          TEXT NOT NULL,
            created_at      TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(job_seeker_id, job_id)
        );

        CREATE INDEX IF NOT EXISTS idx_saved_jobs_seeker
            ON saved_jobs(job_seeker_id);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
