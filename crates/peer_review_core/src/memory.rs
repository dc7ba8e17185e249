//! crates/peer_review_core/src/memory.rs
//!
//! An in-memory `WorkflowStore` backed by a mutex. The test suite runs the
//! whole workflow against it; it is also handy for local demos. Ordering of
//! scans mirrors the Postgres adapter (papers newest first, assignments in
//! insertion order).

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    Contributor, EntityId, NewPaper, NewUser, Page, Paper, PaperDraft, PaperStatus,
    PaperStatusEntry, ReviewAssignment, ReviewStatus, ReviewStatusEntry, Role, StatusEntry, User,
};
use crate::ports::{
    AssignmentFilter, AuthorPaperFilter, PaperQuery, PublicWindow, WorkflowError, WorkflowResult,
    WorkflowStore,
};

#[derive(Default)]
struct State {
    users: Vec<User>,
    papers: Vec<Paper>,
    assignments: Vec<ReviewAssignment>,
    next_user_id: EntityId,
    next_paper_id: EntityId,
    next_assignment_id: EntityId,
}

pub struct MemoryStore {
    state: Mutex<State>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                next_user_id: 1,
                next_paper_id: 1,
                next_assignment_id: 1,
                ..Default::default()
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        // A poisoned lock only happens after a panicking test; propagate.
        self.state.lock().expect("memory store lock poisoned")
    }

    //-------------------------------------------------------------------------------------
    // Seeding conveniences (tests and demos)
    //-------------------------------------------------------------------------------------

    pub fn seed_user(&self, new: NewUser) -> User {
        let mut state = self.lock();
        let user = User {
            id: state.next_user_id,
            title: new.title,
            country: new.country,
            first_name: new.first_name,
            last_name: new.last_name,
            specialization: new.specialization,
            affiliation: new.affiliation,
            email: new.email,
            phone: new.phone,
            role: new.role,
        };
        state.next_user_id += 1;
        state.users.push(user.clone());
        user
    }

    pub fn add_author(&self, first_name: &str) -> User {
        self.seed_user(profile(first_name, None, Role::Author))
    }

    pub fn add_chief_editor(&self, first_name: &str) -> User {
        self.seed_user(profile(first_name, None, Role::ChiefEditor))
    }

    pub fn add_section_head(&self, first_name: &str, last_name: Option<&str>) -> User {
        self.seed_user(profile(first_name, last_name, Role::SectionHead))
    }

    /// A freshly submitted paper with a seeded ledger.
    pub fn add_paper(&self, user_id: EntityId) -> Paper {
        self.add_paper_with_status(user_id, PaperStatus::Submitted, Utc::now())
    }

    /// A paper in an arbitrary status, for view-layer tests that need
    /// control over `createdAt`.
    pub fn add_paper_with_status(
        &self,
        user_id: EntityId,
        status: PaperStatus,
        created_at: DateTime<Utc>,
    ) -> Paper {
        let mut state = self.lock();
        let draft = Self::sample_draft();
        let paper = Paper {
            id: state.next_paper_id,
            user_id,
            manu_script_title: draft.manu_script_title,
            manu_script_type: draft.manu_script_type,
            running_title: draft.running_title,
            subject: draft.subject,
            abstract_text: draft.abstract_text,
            corresponding_author_name: draft.corresponding_author_name,
            corresponding_author_email: draft.corresponding_author_email,
            no_of_authors: draft.no_of_authors,
            authors: draft.authors,
            reviewers: draft.reviewers,
            authors_conflict: draft.authors_conflict,
            data_availability: draft.data_availability,
            main_manuscript: draft.main_manuscript.unwrap_or_default(),
            cover_letter: draft.cover_letter,
            supplementary_file: draft.supplementary_file,
            apcs: draft.apcs,
            studied_and_understood: draft.studied_and_understood,
            paper_status: status,
            status_history: vec![StatusEntry {
                status,
                comment: None,
                date: created_at,
            }],
            created_at,
            updated_at: created_at,
        };
        state.next_paper_id += 1;
        state.papers.push(paper.clone());
        paper
    }

    /// A complete, valid submission draft.
    pub fn sample_draft() -> PaperDraft {
        let person = |name: &str| Contributor {
            full_name: name.to_string(),
            affiliation: "University X".into(),
            country: "Freedonia".into(),
            email: format!("{}@example.org", name.to_lowercase().replace(' ', ".")),
        };
        PaperDraft {
            manu_script_title: "On the Electrodynamics of Moving Bodies".into(),
            manu_script_type: "Research Article".into(),
            running_title: "Moving Bodies".into(),
            subject: "Physics".into(),
            abstract_text: "We examine the consequences of a finite light speed.".into(),
            corresponding_author_name: "Ada Lovelace".into(),
            corresponding_author_email: "ada@example.org".into(),
            no_of_authors: 1,
            authors: vec![person("Ada Lovelace")],
            reviewers: vec![person("R One"), person("R Two"), person("R Three")],
            authors_conflict: None,
            data_availability: None,
            main_manuscript: Some("/assets/manuscript.pdf".into()),
            cover_letter: None,
            supplementary_file: None,
            apcs: false,
            studied_and_understood: false,
        }
    }
}

fn profile(first_name: &str, last_name: Option<&str>, role: Role) -> NewUser {
    NewUser {
        title: Some("Dr".into()),
        country: Some("Freedonia".into()),
        first_name: first_name.to_string(),
        last_name: last_name.map(str::to_string),
        specialization: None,
        affiliation: Some("University X".into()),
        email: format!("{}@example.org", first_name.to_lowercase()),
        phone: None,
        role,
    }
}

fn paginate<T: Clone>(items: &[T], page: Page) -> (Vec<T>, u64) {
    let total = items.len() as u64;
    let out = items
        .iter()
        .skip(page.offset as usize)
        .take(page.limit as usize)
        .cloned()
        .collect();
    (out, total)
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[async_trait]
impl WorkflowStore for MemoryStore {
    async fn create_user(&self, user: NewUser) -> WorkflowResult<User> {
        {
            let state = self.lock();
            if state.users.iter().any(|u| u.email == user.email) {
                return Err(WorkflowError::Conflict("User already exists".into()));
            }
        }
        Ok(self.seed_user(user))
    }

    async fn get_user(&self, id: EntityId) -> WorkflowResult<Option<User>> {
        Ok(self.lock().users.iter().find(|u| u.id == id).cloned())
    }

    async fn get_users_by_ids(&self, ids: &[EntityId]) -> WorkflowResult<Vec<User>> {
        Ok(self
            .lock()
            .users
            .iter()
            .filter(|u| ids.contains(&u.id))
            .cloned()
            .collect())
    }

    async fn list_users(&self, page: Page) -> WorkflowResult<(Vec<User>, u64)> {
        Ok(paginate(&self.lock().users, page))
    }

    async fn create_paper(&self, new: NewPaper) -> WorkflowResult<Paper> {
        let mut state = self.lock();
        let now = Utc::now();
        let d = new.draft;
        let paper = Paper {
            id: state.next_paper_id,
            user_id: new.user_id,
            manu_script_title: d.manu_script_title,
            manu_script_type: d.manu_script_type,
            running_title: d.running_title,
            subject: d.subject,
            abstract_text: d.abstract_text,
            corresponding_author_name: d.corresponding_author_name,
            corresponding_author_email: d.corresponding_author_email,
            no_of_authors: d.no_of_authors,
            authors: d.authors,
            reviewers: d.reviewers,
            authors_conflict: d.authors_conflict,
            data_availability: d.data_availability,
            main_manuscript: d.main_manuscript.unwrap_or_default(),
            cover_letter: d.cover_letter,
            supplementary_file: d.supplementary_file,
            apcs: d.apcs,
            studied_and_understood: d.studied_and_understood,
            paper_status: new.paper_status,
            status_history: new.status_history,
            created_at: now,
            updated_at: now,
        };
        state.next_paper_id += 1;
        state.papers.push(paper.clone());
        Ok(paper)
    }

    async fn get_paper(&self, id: EntityId) -> WorkflowResult<Option<Paper>> {
        Ok(self.lock().papers.iter().find(|p| p.id == id).cloned())
    }

    async fn get_papers_by_ids(&self, ids: &[EntityId]) -> WorkflowResult<Vec<Paper>> {
        Ok(self
            .lock()
            .papers
            .iter()
            .filter(|p| ids.contains(&p.id))
            .cloned()
            .collect())
    }

    async fn update_paper_status(
        &self,
        paper_id: EntityId,
        status: PaperStatus,
        history: Vec<PaperStatusEntry>,
    ) -> WorkflowResult<()> {
        let mut state = self.lock();
        let paper = state
            .papers
            .iter_mut()
            .find(|p| p.id == paper_id)
            .ok_or_else(|| WorkflowError::NotFound("Paper not found".into()))?;
        paper.paper_status = status;
        paper.status_history = history;
        paper.updated_at = Utc::now();
        Ok(())
    }

    async fn list_papers(
        &self,
        query: PaperQuery,
        page: Page,
    ) -> WorkflowResult<(Vec<Paper>, u64)> {
        let state = self.lock();
        let mut matches: Vec<Paper> = state
            .papers
            .iter()
            .filter(|p| query.status.map_or(true, |s| p.paper_status == s))
            .filter(|p| query.paper_id.map_or(true, |id| p.id == id))
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(paginate(&matches, page))
    }

    async fn search_author_papers(
        &self,
        filter: &AuthorPaperFilter,
        page: Page,
    ) -> WorkflowResult<(Vec<Paper>, u64)> {
        let state = self.lock();
        let mut matches: Vec<Paper> = state
            .papers
            .iter()
            .filter(|p| filter.user_id.map_or(true, |id| p.user_id == id))
            .filter(|p| {
                filter
                    .manu_script_title
                    .as_deref()
                    .map_or(true, |t| contains_ci(&p.manu_script_title, t))
            })
            .filter(|p| {
                // Join with the owning user for the title/name filters.
                let owner = state.users.iter().find(|u| u.id == p.user_id);
                let Some(owner) = owner else {
                    return filter.title.is_none() && filter.name.is_none();
                };
                let title_ok = filter.title.as_deref().map_or(true, |t| {
                    owner.title.as_deref().is_some_and(|v| contains_ci(v, t))
                });
                let name_ok = filter.name.as_deref().map_or(true, |n| {
                    contains_ci(&owner.first_name, n)
                        || owner.last_name.as_deref().is_some_and(|v| contains_ci(v, n))
                });
                title_ok && name_ok
            })
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(paginate(&matches, page))
    }

    async fn list_published(
        &self,
        window: Option<PublicWindow>,
        cutoff: DateTime<Utc>,
        page: Page,
    ) -> WorkflowResult<(Vec<Paper>, u64)> {
        let state = self.lock();
        let mut matches: Vec<Paper> = state
            .papers
            .iter()
            .filter(|p| p.paper_status == PaperStatus::Published)
            .filter(|p| match window {
                Some(PublicWindow::Archive) => p.created_at < cutoff,
                Some(PublicWindow::InPress) => p.created_at > cutoff,
                None => true,
            })
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(paginate(&matches, page))
    }

    async fn create_assignment(
        &self,
        paper_id: EntityId,
        section_head_id: EntityId,
        seed: ReviewStatusEntry,
    ) -> WorkflowResult<ReviewAssignment> {
        let mut state = self.lock();
        let now = Utc::now();
        let assignment = ReviewAssignment {
            id: state.next_assignment_id,
            paper_id,
            section_head_id,
            status: seed.status,
            status_history: vec![seed],
            created_at: now,
            updated_at: now,
        };
        state.next_assignment_id += 1;
        state.assignments.push(assignment.clone());
        Ok(assignment)
    }

    async fn find_assignment(
        &self,
        paper_id: EntityId,
        section_head_id: EntityId,
    ) -> WorkflowResult<Option<ReviewAssignment>> {
        Ok(self
            .lock()
            .assignments
            .iter()
            .find(|a| a.paper_id == paper_id && a.section_head_id == section_head_id)
            .cloned())
    }

    async fn assignments_for_papers(
        &self,
        paper_ids: &[EntityId],
    ) -> WorkflowResult<Vec<ReviewAssignment>> {
        Ok(self
            .lock()
            .assignments
            .iter()
            .filter(|a| paper_ids.contains(&a.paper_id))
            .cloned()
            .collect())
    }

    async fn list_assignments(
        &self,
        filter: AssignmentFilter,
        page: Page,
    ) -> WorkflowResult<(Vec<ReviewAssignment>, u64)> {
        let state = self.lock();
        let matches: Vec<ReviewAssignment> = state
            .assignments
            .iter()
            .filter(|a| filter.paper_id.map_or(true, |id| a.paper_id == id))
            .filter(|a| {
                filter
                    .section_head_id
                    .map_or(true, |id| a.section_head_id == id)
            })
            .filter(|a| filter.status.map_or(true, |s| a.status == s))
            .cloned()
            .collect();
        Ok(paginate(&matches, page))
    }

    async fn update_assignment_status(
        &self,
        assignment_id: EntityId,
        status: ReviewStatus,
        history: Vec<ReviewStatusEntry>,
    ) -> WorkflowResult<()> {
        let mut state = self.lock();
        let assignment = state
            .assignments
            .iter_mut()
            .find(|a| a.id == assignment_id)
            .ok_or_else(|| WorkflowError::NotFound("Assignment not found".into()))?;
        assignment.status = status;
        assignment.status_history = history;
        assignment.updated_at = Utc::now();
        Ok(())
    }
}
