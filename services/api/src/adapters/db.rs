//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, the concrete implementation of
//! the `WorkflowStore` port from the core crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.
//!
//! Queries use the runtime API (`query_as` + `bind`) so the crate builds
//! without a live database. Optional filters use the `$n IS NULL OR ...`
//! pattern, keeping one prepared statement per operation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPool;
use sqlx::types::Json;
use sqlx::FromRow;

use peer_review_core::domain::{
    Contributor, EntityId, NewPaper, NewUser, Page, Paper, PaperStatus, PaperStatusEntry,
    ReviewAssignment, ReviewStatus, ReviewStatusEntry, Role, User,
};
use peer_review_core::ports::{
    AssignmentFilter, AuthorPaperFilter, PaperQuery, PublicWindow, WorkflowError, WorkflowResult,
    WorkflowStore,
};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `WorkflowStore` port.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Creates a new `PgStore`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn fault(e: sqlx::Error) -> WorkflowError {
    WorkflowError::Fault(e.to_string())
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    id: i64,
    title: Option<String>,
    country: Option<String>,
    first_name: String,
    last_name: Option<String>,
    specialization: Option<String>,
    affiliation: Option<String>,
    email: String,
    phone: Option<String>,
    role: String,
}

impl UserRecord {
    fn to_domain(self) -> WorkflowResult<User> {
        let role = Role::parse(&self.role)
            .ok_or_else(|| WorkflowError::Fault(format!("unknown role in store: {}", self.role)))?;
        Ok(User {
            id: self.id,
            title: self.title,
            country: self.country,
            first_name: self.first_name,
            last_name: self.last_name,
            specialization: self.specialization,
            affiliation: self.affiliation,
            email: self.email,
            phone: self.phone,
            role,
        })
    }
}

#[derive(FromRow)]
struct PaperRecord {
    id: i64,
    user_id: i64,
    manu_script_title: String,
    manu_script_type: String,
    running_title: String,
    subject: String,
    abstract_text: String,
    corresponding_author_name: String,
    corresponding_author_email: String,
    no_of_authors: i32,
    authors: Json<Vec<Contributor>>,
    reviewers: Json<Vec<Contributor>>,
    authors_conflict: Option<String>,
    data_availability: Option<String>,
    main_manuscript: String,
    cover_letter: Option<String>,
    supplementary_file: Option<String>,
    apcs: bool,
    studied_and_understood: bool,
    paper_status: String,
    status_history: Json<Vec<PaperStatusEntry>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PaperRecord {
    fn to_domain(self) -> WorkflowResult<Paper> {
        let paper_status = PaperStatus::parse(&self.paper_status).ok_or_else(|| {
            WorkflowError::Fault(format!("unknown paper status in store: {}", self.paper_status))
        })?;
        Ok(Paper {
            id: self.id,
            user_id: self.user_id,
            manu_script_title: self.manu_script_title,
            manu_script_type: self.manu_script_type,
            running_title: self.running_title,
            subject: self.subject,
            abstract_text: self.abstract_text,
            corresponding_author_name: self.corresponding_author_name,
            corresponding_author_email: self.corresponding_author_email,
            no_of_authors: self.no_of_authors,
            authors: self.authors.0,
            reviewers: self.reviewers.0,
            authors_conflict: self.authors_conflict,
            data_availability: self.data_availability,
            main_manuscript: self.main_manuscript,
            cover_letter: self.cover_letter,
            supplementary_file: self.supplementary_file,
            apcs: self.apcs,
            studied_and_understood: self.studied_and_understood,
            paper_status,
            status_history: self.status_history.0,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(FromRow)]
struct AssignmentRecord {
    id: i64,
    paper_id: i64,
    section_head_id: i64,
    status: String,
    status_history: Json<Vec<ReviewStatusEntry>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl AssignmentRecord {
    fn to_domain(self) -> WorkflowResult<ReviewAssignment> {
        let status = ReviewStatus::parse(&self.status).ok_or_else(|| {
            WorkflowError::Fault(format!("unknown review status in store: {}", self.status))
        })?;
        Ok(ReviewAssignment {
            id: self.id,
            paper_id: self.paper_id,
            section_head_id: self.section_head_id,
            status,
            status_history: self.status_history.0,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn papers_to_domain(records: Vec<PaperRecord>) -> WorkflowResult<Vec<Paper>> {
    records.into_iter().map(PaperRecord::to_domain).collect()
}

fn assignments_to_domain(records: Vec<AssignmentRecord>) -> WorkflowResult<Vec<ReviewAssignment>> {
    records.into_iter().map(AssignmentRecord::to_domain).collect()
}

//=========================================================================================
// `WorkflowStore` Trait Implementation
//=========================================================================================

const PAPER_COLUMNS: &str = "id, user_id, manu_script_title, manu_script_type, running_title, \
     subject, abstract_text, corresponding_author_name, corresponding_author_email, \
     no_of_authors, authors, reviewers, authors_conflict, data_availability, main_manuscript, \
     cover_letter, supplementary_file, apcs, studied_and_understood, paper_status, \
     status_history, created_at, updated_at";

const USER_COLUMNS: &str = "id, title, country, first_name, last_name, specialization, \
     affiliation, email, phone, role";

const ASSIGNMENT_COLUMNS: &str =
    "id, paper_id, section_head_id, status, status_history, created_at, updated_at";

#[async_trait]
impl WorkflowStore for PgStore {
    async fn create_user(&self, user: NewUser) -> WorkflowResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "INSERT INTO users (title, country, first_name, last_name, specialization, \
             affiliation, email, phone, role) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(&user.title)
        .bind(&user.country)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.specialization)
        .bind(&user.affiliation)
        .bind(&user.email)
        .bind(&user.phone)
        .bind(user.role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                WorkflowError::Conflict("User already exists".into())
            } else {
                fault(e)
            }
        })?;
        record.to_domain()
    }

    async fn get_user(&self, id: EntityId) -> WorkflowResult<Option<User>> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(fault)?;
        record.map(UserRecord::to_domain).transpose()
    }

    async fn get_users_by_ids(&self, ids: &[EntityId]) -> WorkflowResult<Vec<User>> {
        let records = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ANY($1)"
        ))
        .bind(ids.to_vec())
        .fetch_all(&self.pool)
        .await
        .map_err(fault)?;
        records.into_iter().map(UserRecord::to_domain).collect()
    }

    async fn list_users(&self, page: Page) -> WorkflowResult<(Vec<User>, u64)> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .map_err(fault)?;
        let records = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY id OFFSET $1 LIMIT $2"
        ))
        .bind(page.offset as i64)
        .bind(page.limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(fault)?;
        let users: WorkflowResult<Vec<User>> =
            records.into_iter().map(UserRecord::to_domain).collect();
        Ok((users?, total as u64))
    }

    async fn create_paper(&self, new: NewPaper) -> WorkflowResult<Paper> {
        let d = new.draft;
        let record = sqlx::query_as::<_, PaperRecord>(&format!(
            "INSERT INTO papers (user_id, manu_script_title, manu_script_type, running_title, \
             subject, abstract_text, corresponding_author_name, corresponding_author_email, \
             no_of_authors, authors, reviewers, authors_conflict, data_availability, \
             main_manuscript, cover_letter, supplementary_file, apcs, studied_and_understood, \
             paper_status, status_history) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, \
             $17, $18, $19, $20) \
             RETURNING {PAPER_COLUMNS}"
        ))
        .bind(new.user_id)
        .bind(&d.manu_script_title)
        .bind(&d.manu_script_type)
        .bind(&d.running_title)
        .bind(&d.subject)
        .bind(&d.abstract_text)
        .bind(&d.corresponding_author_name)
        .bind(&d.corresponding_author_email)
        .bind(d.no_of_authors)
        .bind(Json(&d.authors))
        .bind(Json(&d.reviewers))
        .bind(&d.authors_conflict)
        .bind(&d.data_availability)
        .bind(d.main_manuscript.as_deref().unwrap_or_default())
        .bind(&d.cover_letter)
        .bind(&d.supplementary_file)
        .bind(d.apcs)
        .bind(d.studied_and_understood)
        .bind(new.paper_status.as_str())
        .bind(Json(&new.status_history))
        .fetch_one(&self.pool)
        .await
        .map_err(fault)?;
        record.to_domain()
    }

    async fn get_paper(&self, id: EntityId) -> WorkflowResult<Option<Paper>> {
        let record = sqlx::query_as::<_, PaperRecord>(&format!(
            "SELECT {PAPER_COLUMNS} FROM papers WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(fault)?;
        record.map(PaperRecord::to_domain).transpose()
    }

    async fn get_papers_by_ids(&self, ids: &[EntityId]) -> WorkflowResult<Vec<Paper>> {
        let records = sqlx::query_as::<_, PaperRecord>(&format!(
            "SELECT {PAPER_COLUMNS} FROM papers WHERE id = ANY($1)"
        ))
        .bind(ids.to_vec())
        .fetch_all(&self.pool)
        .await
        .map_err(fault)?;
        papers_to_domain(records)
    }

    async fn update_paper_status(
        &self,
        paper_id: EntityId,
        status: PaperStatus,
        history: Vec<PaperStatusEntry>,
    ) -> WorkflowResult<()> {
        let result = sqlx::query(
            "UPDATE papers SET paper_status = $1, status_history = $2, updated_at = now() \
             WHERE id = $3",
        )
        .bind(status.as_str())
        .bind(Json(&history))
        .bind(paper_id)
        .execute(&self.pool)
        .await
        .map_err(fault)?;
        if result.rows_affected() == 0 {
            return Err(WorkflowError::NotFound("Paper not found".into()));
        }
        Ok(())
    }

    async fn list_papers(
        &self,
        query: PaperQuery,
        page: Page,
    ) -> WorkflowResult<(Vec<Paper>, u64)> {
        let status = query.status.map(|s| s.as_str());
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM papers \
             WHERE ($1::text IS NULL OR paper_status = $1) \
             AND ($2::bigint IS NULL OR id = $2)",
        )
        .bind(status)
        .bind(query.paper_id)
        .fetch_one(&self.pool)
        .await
        .map_err(fault)?;

        let records = sqlx::query_as::<_, PaperRecord>(&format!(
            "SELECT {PAPER_COLUMNS} FROM papers \
             WHERE ($1::text IS NULL OR paper_status = $1) \
             AND ($2::bigint IS NULL OR id = $2) \
             ORDER BY created_at DESC, id DESC OFFSET $3 LIMIT $4"
        ))
        .bind(status)
        .bind(query.paper_id)
        .bind(page.offset as i64)
        .bind(page.limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(fault)?;
        Ok((papers_to_domain(records)?, total as u64))
    }

    async fn search_author_papers(
        &self,
        filter: &AuthorPaperFilter,
        page: Page,
    ) -> WorkflowResult<(Vec<Paper>, u64)> {
        const CONDITION: &str = "($1::bigint IS NULL OR p.user_id = $1) \
             AND ($2::text IS NULL OR p.manu_script_title ILIKE '%' || $2 || '%') \
             AND ($3::text IS NULL OR u.title ILIKE '%' || $3 || '%') \
             AND ($4::text IS NULL OR u.first_name ILIKE '%' || $4 || '%' \
                  OR u.last_name ILIKE '%' || $4 || '%')";

        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM papers p JOIN users u ON u.id = p.user_id WHERE {CONDITION}"
        ))
        .bind(filter.user_id)
        .bind(&filter.manu_script_title)
        .bind(&filter.title)
        .bind(&filter.name)
        .fetch_one(&self.pool)
        .await
        .map_err(fault)?;

        let columns = paper_columns_qualified();
        let records = sqlx::query_as::<_, PaperRecord>(&format!(
            "SELECT {columns} FROM papers p JOIN users u ON u.id = p.user_id \
             WHERE {CONDITION} ORDER BY p.created_at DESC, p.id DESC OFFSET $5 LIMIT $6"
        ))
        .bind(filter.user_id)
        .bind(&filter.manu_script_title)
        .bind(&filter.title)
        .bind(&filter.name)
        .bind(page.offset as i64)
        .bind(page.limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(fault)?;
        Ok((papers_to_domain(records)?, total as u64))
    }

    async fn list_published(
        &self,
        window: Option<PublicWindow>,
        cutoff: DateTime<Utc>,
        page: Page,
    ) -> WorkflowResult<(Vec<Paper>, u64)> {
        // The window keyword is resolved to a comparison here; both arms
        // compare against the same cutoff instant.
        let window_sql = match window {
            Some(PublicWindow::Archive) => "AND created_at < $1",
            Some(PublicWindow::InPress) => "AND created_at > $1",
            None => "AND $1::timestamptz IS NOT NULL",
        };

        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM papers WHERE paper_status = 'published' {window_sql}"
        ))
        .bind(cutoff)
        .fetch_one(&self.pool)
        .await
        .map_err(fault)?;

        let records = sqlx::query_as::<_, PaperRecord>(&format!(
            "SELECT {PAPER_COLUMNS} FROM papers WHERE paper_status = 'published' {window_sql} \
             ORDER BY created_at DESC, id DESC OFFSET $2 LIMIT $3"
        ))
        .bind(cutoff)
        .bind(page.offset as i64)
        .bind(page.limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(fault)?;
        Ok((papers_to_domain(records)?, total as u64))
    }

    async fn create_assignment(
        &self,
        paper_id: EntityId,
        section_head_id: EntityId,
        seed: ReviewStatusEntry,
    ) -> WorkflowResult<ReviewAssignment> {
        let status = seed.status;
        let record = sqlx::query_as::<_, AssignmentRecord>(&format!(
            "INSERT INTO review_assignments (paper_id, section_head_id, status, status_history) \
             VALUES ($1, $2, $3, $4) RETURNING {ASSIGNMENT_COLUMNS}"
        ))
        .bind(paper_id)
        .bind(section_head_id)
        .bind(status.as_str())
        .bind(Json(vec![seed]))
        .fetch_one(&self.pool)
        .await
        .map_err(fault)?;
        record.to_domain()
    }

    async fn find_assignment(
        &self,
        paper_id: EntityId,
        section_head_id: EntityId,
    ) -> WorkflowResult<Option<ReviewAssignment>> {
        // Duplicate rows are possible for one pair; the earliest row wins.
        let record = sqlx::query_as::<_, AssignmentRecord>(&format!(
            "SELECT {ASSIGNMENT_COLUMNS} FROM review_assignments \
             WHERE paper_id = $1 AND section_head_id = $2 ORDER BY id LIMIT 1"
        ))
        .bind(paper_id)
        .bind(section_head_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(fault)?;
        record.map(AssignmentRecord::to_domain).transpose()
    }

    async fn assignments_for_papers(
        &self,
        paper_ids: &[EntityId],
    ) -> WorkflowResult<Vec<ReviewAssignment>> {
        let records = sqlx::query_as::<_, AssignmentRecord>(&format!(
            "SELECT {ASSIGNMENT_COLUMNS} FROM review_assignments WHERE paper_id = ANY($1)"
        ))
        .bind(paper_ids.to_vec())
        .fetch_all(&self.pool)
        .await
        .map_err(fault)?;
        assignments_to_domain(records)
    }

    async fn list_assignments(
        &self,
        filter: AssignmentFilter,
        page: Page,
    ) -> WorkflowResult<(Vec<ReviewAssignment>, u64)> {
        const CONDITION: &str = "($1::bigint IS NULL OR paper_id = $1) \
             AND ($2::bigint IS NULL OR section_head_id = $2) \
             AND ($3::text IS NULL OR status = $3)";
        let status = filter.status.map(|s| s.as_str());

        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM review_assignments WHERE {CONDITION}"
        ))
        .bind(filter.paper_id)
        .bind(filter.section_head_id)
        .bind(status)
        .fetch_one(&self.pool)
        .await
        .map_err(fault)?;

        let records = sqlx::query_as::<_, AssignmentRecord>(&format!(
            "SELECT {ASSIGNMENT_COLUMNS} FROM review_assignments WHERE {CONDITION} \
             ORDER BY id OFFSET $4 LIMIT $5"
        ))
        .bind(filter.paper_id)
        .bind(filter.section_head_id)
        .bind(status)
        .bind(page.offset as i64)
        .bind(page.limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(fault)?;
        Ok((assignments_to_domain(records)?, total as u64))
    }

    async fn update_assignment_status(
        &self,
        assignment_id: EntityId,
        status: ReviewStatus,
        history: Vec<ReviewStatusEntry>,
    ) -> WorkflowResult<()> {
        let result = sqlx::query(
            "UPDATE review_assignments SET status = $1, status_history = $2, updated_at = now() \
             WHERE id = $3",
        )
        .bind(status.as_str())
        .bind(Json(&history))
        .bind(assignment_id)
        .execute(&self.pool)
        .await
        .map_err(fault)?;
        if result.rows_affected() == 0 {
            return Err(WorkflowError::NotFound("Assignment not found".into()));
        }
        Ok(())
    }
}

/// `p.`-qualified paper column list for joined queries.
fn paper_columns_qualified() -> String {
    PAPER_COLUMNS
        .split(", ")
        .map(|c| format!("p.{}", c.trim()))
        .collect::<Vec<_>>()
        .join(", ")
}
