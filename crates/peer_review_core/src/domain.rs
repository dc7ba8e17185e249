//! crates/peer_review_core/src/domain.rs
//!
//! Defines the pure, core data structures for the peer-review workflow.
//! These structs are independent of any database or HTTP framework; the
//! camelCase serde names match the public API wire format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Database identifiers are plain 64-bit integers (BIGSERIAL columns).
pub type EntityId = i64;

//=========================================================================================
// Users and roles
//=========================================================================================

/// The role attached to a user account. Immutable after creation in the
/// normal flow; there is no role-change operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Role {
    Author,
    ChiefEditor,
    SectionHead,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Author => "author",
            Role::ChiefEditor => "chiefEditor",
            Role::SectionHead => "sectionHead",
        }
    }

    /// Parses the case-exact role keyword. The historical `cheifEditor` /
    /// `sectionhead` spellings are not accepted.
    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "author" => Some(Role::Author),
            "chiefEditor" => Some(Role::ChiefEditor),
            "sectionHead" => Some(Role::SectionHead),
            _ => None,
        }
    }
}

/// A registered user. Credentials live with the external identity
/// provider and are never stored here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: EntityId,
    pub title: Option<String>,
    pub country: Option<String>,
    pub first_name: String,
    pub last_name: Option<String>,
    pub specialization: Option<String>,
    pub affiliation: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub role: Role,
}

impl User {
    /// Display name used in assignment ledger comments.
    pub fn display_name(&self) -> String {
        match &self.last_name {
            Some(last) => format!("{} {}", self.first_name, last),
            None => self.first_name.clone(),
        }
    }
}

/// Profile fields for a new user record; the store assigns the id.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub title: Option<String>,
    pub country: Option<String>,
    pub first_name: String,
    pub last_name: Option<String>,
    pub specialization: Option<String>,
    pub affiliation: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub role: Role,
}

/// The public projection of a section head attached to paper views.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionHeadProfile {
    pub id: EntityId,
    pub title: Option<String>,
    pub first_name: String,
    pub last_name: Option<String>,
    pub email: String,
}

impl From<&User> for SectionHeadProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            title: user.title.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
        }
    }
}

//=========================================================================================
// Papers
//=========================================================================================

/// The top-level lifecycle status of a paper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PaperStatus {
    Submitted,
    UnderReview,
    Published,
    Rejected,
}

impl PaperStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaperStatus::Submitted => "submitted",
            PaperStatus::UnderReview => "underReview",
            PaperStatus::Published => "published",
            PaperStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<PaperStatus> {
        match s {
            "submitted" => Some(PaperStatus::Submitted),
            "underReview" => Some(PaperStatus::UnderReview),
            "published" => Some(PaperStatus::Published),
            "rejected" => Some(PaperStatus::Rejected),
            _ => None,
        }
    }
}

/// One entry of an append-only status ledger. The last entry's status
/// always mirrors the owning record's current status.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusEntry<S> {
    pub status: S,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub date: DateTime<Utc>,
}

pub type PaperStatusEntry = StatusEntry<PaperStatus>;
pub type ReviewStatusEntry = StatusEntry<ReviewStatus>;

/// A person listed on a submission, either as a co-author or as a
/// suggested reviewer. All four fields are required and non-empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contributor {
    pub full_name: String,
    pub affiliation: String,
    pub country: String,
    pub email: String,
}

impl Contributor {
    pub fn is_complete(&self) -> bool {
        !self.full_name.trim().is_empty()
            && !self.affiliation.trim().is_empty()
            && !self.country.trim().is_empty()
            && !self.email.trim().is_empty()
    }
}

/// A submitted manuscript. File references are stored as relative paths;
/// turning them into absolute URLs is a presentation concern.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Paper {
    pub id: EntityId,
    pub user_id: EntityId,
    pub manu_script_title: String,
    pub manu_script_type: String,
    pub running_title: String,
    pub subject: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub corresponding_author_name: String,
    pub corresponding_author_email: String,
    pub no_of_authors: i32,
    pub authors: Vec<Contributor>,
    pub reviewers: Vec<Contributor>,
    pub authors_conflict: Option<String>,
    pub data_availability: Option<String>,
    pub main_manuscript: String,
    pub cover_letter: Option<String>,
    pub supplementary_file: Option<String>,
    pub apcs: bool,
    pub studied_and_understood: bool,
    pub paper_status: PaperStatus,
    pub status_history: Vec<PaperStatusEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The author-provided fields of a new submission. The lifecycle engine
/// validates these and seeds the status ledger.
#[derive(Debug, Clone)]
pub struct PaperDraft {
    pub manu_script_title: String,
    pub manu_script_type: String,
    pub running_title: String,
    pub subject: String,
    pub abstract_text: String,
    pub corresponding_author_name: String,
    pub corresponding_author_email: String,
    pub no_of_authors: i32,
    pub authors: Vec<Contributor>,
    pub reviewers: Vec<Contributor>,
    pub authors_conflict: Option<String>,
    pub data_availability: Option<String>,
    pub main_manuscript: Option<String>,
    pub cover_letter: Option<String>,
    pub supplementary_file: Option<String>,
    pub apcs: bool,
    pub studied_and_understood: bool,
}

/// A validated paper record ready for insertion; produced only by the
/// lifecycle engine so that every paper is born with a seeded ledger.
#[derive(Debug, Clone)]
pub struct NewPaper {
    pub user_id: EntityId,
    pub draft: PaperDraft,
    pub paper_status: PaperStatus,
    pub status_history: Vec<PaperStatusEntry>,
}

//=========================================================================================
// Review assignments
//=========================================================================================

/// A section head's standing on one review assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReviewStatus {
    Assigned,
    Accepted,
    Rejected,
}

impl ReviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::Assigned => "assigned",
            ReviewStatus::Accepted => "accepted",
            ReviewStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<ReviewStatus> {
        match s {
            "assigned" => Some(ReviewStatus::Assigned),
            "accepted" => Some(ReviewStatus::Accepted),
            "rejected" => Some(ReviewStatus::Rejected),
            _ => None,
        }
    }
}

/// The join record tying one section head's review task to one paper.
/// Created by the chief editor's assign action, mutated by the section
/// head's decision, never deleted.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewAssignment {
    pub id: EntityId,
    pub paper_id: EntityId,
    pub section_head_id: EntityId,
    pub status: ReviewStatus,
    pub status_history: Vec<ReviewStatusEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//=========================================================================================
// Pagination
//=========================================================================================

/// Offset/limit window for paginated scans. Defaults to the first ten
/// records, matching the public API defaults.
#[derive(Debug, Clone, Copy)]
pub struct Page {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Page {
    fn default() -> Self {
        Self { offset: 0, limit: 10 }
    }
}

impl Page {
    pub fn new(offset: u64, limit: u64) -> Self {
        Self { offset, limit }
    }
}

/// Pagination metadata returned alongside every paginated view.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
    pub total_pages: u64,
    pub current_page: u64,
}

impl PageMeta {
    pub fn new(total: u64, page: Page) -> Self {
        // Guard against a zero limit; the window is then a single page.
        let limit = page.limit.max(1);
        Self {
            total,
            offset: page.offset,
            limit: page.limit,
            total_pages: total.div_ceil(limit),
            current_page: page.offset / limit + 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_strings_round_trip() {
        for status in [
            PaperStatus::Submitted,
            PaperStatus::UnderReview,
            PaperStatus::Published,
            PaperStatus::Rejected,
        ] {
            assert_eq!(PaperStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(PaperStatus::parse("underreview"), None);
        assert_eq!(Role::parse("cheifEditor"), None);
    }

    #[test]
    fn status_entry_wire_shape() {
        let entry: PaperStatusEntry = StatusEntry {
            status: PaperStatus::UnderReview,
            comment: None,
            date: Utc::now(),
        };
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["status"], "underReview");
        // Absent comments are omitted entirely, not serialized as null.
        assert!(value.get("comment").is_none());
    }

    #[test]
    fn paper_serializes_abstract_under_its_api_name() {
        let paper = Paper {
            id: 1,
            user_id: 1,
            manu_script_title: "T".into(),
            manu_script_type: "Research Article".into(),
            running_title: "T".into(),
            subject: "S".into(),
            abstract_text: "A".into(),
            corresponding_author_name: "Ada".into(),
            corresponding_author_email: "ada@example.org".into(),
            no_of_authors: 1,
            authors: vec![],
            reviewers: vec![],
            authors_conflict: None,
            data_availability: None,
            main_manuscript: "/assets/m.pdf".into(),
            cover_letter: None,
            supplementary_file: None,
            apcs: false,
            studied_and_understood: false,
            paper_status: PaperStatus::Submitted,
            status_history: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let value = serde_json::to_value(&paper).unwrap();
        assert_eq!(value["abstract"], "A");
        assert!(value.get("abstractText").is_none());
        assert_eq!(value["manuScriptTitle"], "T");
    }

    #[test]
    fn user_profile_wire_names() {
        let user = User {
            id: 1,
            title: None,
            country: None,
            first_name: "Ada".into(),
            last_name: Some("Lovelace".into()),
            specialization: None,
            affiliation: None,
            email: "ada@example.org".into(),
            phone: None,
            role: Role::Author,
        };
        let value = serde_json::to_value(&user).unwrap();
        assert_eq!(value["firstName"], "Ada");
        assert_eq!(value["role"], "author");
        assert_eq!(user.display_name(), "Ada Lovelace");
    }
}
