//! crates/peer_review_core/src/views.rs
//!
//! The Query/View Composer: role-scoped, paginated, joined read views over
//! papers, review assignments and users. Views never mutate state; they
//! stitch cross-entity responses out of store scans.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::domain::{
    EntityId, Page, PageMeta, Paper, PaperStatus, ReviewStatus, SectionHeadProfile,
};
use crate::ports::{
    AssignmentFilter, AuthorPaperFilter, PaperQuery, PublicWindow, WorkflowError, WorkflowResult,
    WorkflowStore,
};

/// Window, in days, separating "archive" from "in press" in the public
/// listing. Both filters compare against the same instant.
const PUBLIC_WINDOW_DAYS: i64 = 30;

//=========================================================================================
// View payloads
//=========================================================================================

/// A paper enriched with the section heads currently assigned to it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaperWithReviewers {
    #[serde(flatten)]
    pub paper: Paper,
    /// Present only on the under-review enrichment path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<Vec<SectionHeadProfile>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaperStatusPage {
    pub papers: Vec<PaperWithReviewers>,
    pub pagination: PageMeta,
}

/// The section-head header block of the assigned-papers view.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionHeadSummary {
    #[serde(flatten)]
    pub profile: SectionHeadProfile,
    pub total_assigned_papers: u64,
}

/// One paper in a section head's queue, projected to public fields plus
/// that section head's own review status.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignedPaper {
    pub id: EntityId,
    pub manu_script_title: String,
    pub manu_script_type: String,
    pub paper_status: PaperStatus,
    pub corresponding_author_name: String,
    pub corresponding_author_email: String,
    pub reviewer_status: ReviewStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionHeadQueue {
    pub section_head: SectionHeadSummary,
    pub assigned_papers: Vec<AssignedPaper>,
    pub pagination: PageMeta,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaperPage {
    pub papers: Vec<Paper>,
    pub pagination: PageMeta,
}

//=========================================================================================
// Composer
//=========================================================================================

#[derive(Clone)]
pub struct ViewComposer {
    store: Arc<dyn WorkflowStore>,
}

impl ViewComposer {
    pub fn new(store: Arc<dyn WorkflowStore>) -> Self {
        Self { store }
    }

    /// Point lookup used by the public read path.
    pub async fn paper_by_id(&self, id: EntityId) -> WorkflowResult<Paper> {
        self.store
            .get_paper(id)
            .await?
            .ok_or_else(|| WorkflowError::NotFound("Paper not found".into()))
    }

    /// The editorial queue, filtered by a user-facing status keyword.
    ///
    /// Keyword mapping: `accepted → published`, `submitted → submitted`,
    /// `rejected → rejected`, `assigned → underReview`. When the resolved
    /// status is `underReview` (or no status is given but a `paper_id` is),
    /// each paper carries an `assignedTo` list of deduplicated section-head
    /// profiles.
    pub async fn papers_by_status(
        &self,
        status_param: Option<&str>,
        paper_id: Option<EntityId>,
        page: Page,
    ) -> WorkflowResult<PaperStatusPage> {
        let resolved = match status_param {
            Some(keyword) => Some(resolve_status_keyword(keyword)?),
            None => None,
        };

        let (papers, total) = self
            .store
            .list_papers(
                PaperQuery {
                    status: resolved,
                    paper_id,
                },
                page,
            )
            .await?;

        if papers.is_empty() {
            return Err(WorkflowError::NotFound(match status_param {
                Some(keyword) => format!("No papers found with status: {keyword}"),
                None => "No papers found".into(),
            }));
        }

        let enrich = resolved == Some(PaperStatus::UnderReview)
            || (resolved.is_none() && paper_id.is_some());

        let papers = if enrich {
            self.attach_section_heads(papers).await?
        } else {
            papers
                .into_iter()
                .map(|paper| PaperWithReviewers {
                    paper,
                    assigned_to: None,
                })
                .collect()
        };

        Ok(PaperStatusPage {
            papers,
            pagination: PageMeta::new(total, page),
        })
    }

    /// Joins the result page with its review assignments and batch-fetched
    /// section-head profiles.
    async fn attach_section_heads(
        &self,
        papers: Vec<Paper>,
    ) -> WorkflowResult<Vec<PaperWithReviewers>> {
        let paper_ids: Vec<EntityId> = papers.iter().map(|p| p.id).collect();
        let assignments = self.store.assignments_for_papers(&paper_ids).await?;

        let head_ids: Vec<EntityId> = assignments
            .iter()
            .map(|a| a.section_head_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let heads = self.store.get_users_by_ids(&head_ids).await?;

        Ok(papers
            .into_iter()
            .map(|paper| {
                // Deduplicate per paper: two assignment rows for the same
                // section head contribute one profile.
                let assigned_ids: BTreeSet<EntityId> = assignments
                    .iter()
                    .filter(|a| a.paper_id == paper.id)
                    .map(|a| a.section_head_id)
                    .collect();
                let assigned_to = heads
                    .iter()
                    .filter(|u| assigned_ids.contains(&u.id))
                    .map(SectionHeadProfile::from)
                    .collect();
                PaperWithReviewers {
                    paper,
                    assigned_to: Some(assigned_to),
                }
            })
            .collect())
    }

    /// A section head's queue of assigned papers, optionally filtered by
    /// review status. Zero assignments is a valid, empty queue, never an
    /// error.
    pub async fn assigned_papers_for_section_head(
        &self,
        section_head_id: EntityId,
        status: Option<&str>,
        page: Page,
    ) -> WorkflowResult<SectionHeadQueue> {
        let section_head = self
            .store
            .get_user(section_head_id)
            .await?
            .ok_or_else(|| {
                WorkflowError::NotFound(format!("Section head {section_head_id} not found"))
            })?;

        let status = match status {
            Some(keyword) => Some(ReviewStatus::parse(keyword).ok_or_else(|| {
                WorkflowError::InvalidInput(format!("Unknown review status: {keyword}"))
            })?),
            None => None,
        };

        let (assignments, total) = self
            .store
            .list_assignments(
                AssignmentFilter {
                    section_head_id: Some(section_head_id),
                    status,
                    paper_id: None,
                },
                page,
            )
            .await?;

        let paper_ids: Vec<EntityId> = assignments.iter().map(|a| a.paper_id).collect();
        let papers = self.store.get_papers_by_ids(&paper_ids).await?;

        let assigned_papers = papers
            .into_iter()
            .filter_map(|p| {
                let reviewer_status = assignments
                    .iter()
                    .find(|a| a.paper_id == p.id)
                    .map(|a| a.status)?;
                Some(AssignedPaper {
                    id: p.id,
                    manu_script_title: p.manu_script_title,
                    manu_script_type: p.manu_script_type,
                    paper_status: p.paper_status,
                    corresponding_author_name: p.corresponding_author_name,
                    corresponding_author_email: p.corresponding_author_email,
                    reviewer_status,
                    created_at: p.created_at,
                    updated_at: p.updated_at,
                })
            })
            .collect();

        Ok(SectionHeadQueue {
            section_head: SectionHeadSummary {
                profile: SectionHeadProfile::from(&section_head),
                total_assigned_papers: total,
            },
            assigned_papers,
            pagination: PageMeta::new(total, page),
        })
    }

    /// An author's own papers, with optional substring filters against the
    /// owning user's title and name. An empty join is a 404 by contract.
    pub async fn papers_for_author(
        &self,
        filter: AuthorPaperFilter,
        page: Page,
    ) -> WorkflowResult<PaperPage> {
        let (papers, total) = self.store.search_author_papers(&filter, page).await?;
        if papers.is_empty() {
            return Err(WorkflowError::NotFound(
                "No papers found matching the criteria".into(),
            ));
        }
        Ok(PaperPage {
            papers,
            pagination: PageMeta::new(total, page),
        })
    }

    /// The public listing of published papers.
    ///
    /// `archive` keeps papers created more than thirty days ago, `inPress`
    /// papers created within the last thirty days. The `inPress` semantics
    /// are implemented literally as inherited; see DESIGN.md.
    pub async fn public_papers(
        &self,
        archive_or_in_press: Option<&str>,
        page: Page,
    ) -> WorkflowResult<PaperPage> {
        let window = match archive_or_in_press {
            Some("archive") => Some(PublicWindow::Archive),
            Some("inPress") => Some(PublicWindow::InPress),
            Some(other) => {
                return Err(WorkflowError::InvalidInput(format!(
                    "Unknown listing type: {other}"
                )))
            }
            None => None,
        };

        let cutoff = Utc::now() - Duration::days(PUBLIC_WINDOW_DAYS);
        let (papers, total) = self.store.list_published(window, cutoff, page).await?;
        if papers.is_empty() {
            return Err(WorkflowError::NotFound(
                "No papers found matching the criteria".into(),
            ));
        }
        Ok(PaperPage {
            papers,
            pagination: PageMeta::new(total, page),
        })
    }
}

/// Maps the user-facing status keyword onto the internal enum.
fn resolve_status_keyword(keyword: &str) -> WorkflowResult<PaperStatus> {
    match keyword {
        "accepted" => Ok(PaperStatus::Published),
        "submitted" => Ok(PaperStatus::Submitted),
        "rejected" => Ok(PaperStatus::Rejected),
        "assigned" => Ok(PaperStatus::UnderReview),
        other => Err(WorkflowError::InvalidInput(format!(
            "Unknown status keyword: {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ReviewStatusEntry, StatusEntry};
    use crate::memory::MemoryStore;

    fn composer(store: Arc<MemoryStore>) -> ViewComposer {
        ViewComposer::new(store)
    }

    async fn assign(store: &MemoryStore, paper_id: EntityId, head_id: EntityId) {
        let seed: ReviewStatusEntry = StatusEntry {
            status: ReviewStatus::Assigned,
            comment: None,
            date: Utc::now(),
        };
        store
            .create_assignment(paper_id, head_id, seed)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn status_keyword_mapping() {
        assert_eq!(
            resolve_status_keyword("accepted").unwrap(),
            PaperStatus::Published
        );
        assert_eq!(
            resolve_status_keyword("assigned").unwrap(),
            PaperStatus::UnderReview
        );
        assert!(matches!(
            resolve_status_keyword("underReview").unwrap_err(),
            WorkflowError::InvalidInput(_)
        ));
    }

    #[tokio::test]
    async fn assigned_to_is_deduplicated() {
        let store = Arc::new(MemoryStore::new());
        let author = store.add_author("Ada");
        let head = store.add_section_head("Rosa", None);
        let other = store.add_section_head("Ines", None);
        let paper =
            store.add_paper_with_status(author.id, PaperStatus::UnderReview, Utc::now());

        // Two rows for the same section head plus one for another: the
        // view must list each section head exactly once.
        assign(&store, paper.id, head.id).await;
        assign(&store, paper.id, head.id).await;
        assign(&store, paper.id, other.id).await;

        let view = composer(store.clone())
            .papers_by_status(Some("assigned"), None, Page::default())
            .await
            .unwrap();
        let assigned_to = view.papers[0].assigned_to.as_ref().unwrap();
        let mut ids: Vec<EntityId> = assigned_to.iter().map(|h| h.id).collect();
        ids.sort();
        assert_eq!(ids, vec![head.id, other.id]);
    }

    #[tokio::test]
    async fn non_review_statuses_are_not_enriched() {
        let store = Arc::new(MemoryStore::new());
        let author = store.add_author("Ada");
        store.add_paper(author.id);

        let view = composer(store.clone())
            .papers_by_status(Some("submitted"), None, Page::default())
            .await
            .unwrap();
        assert!(view.papers[0].assigned_to.is_none());
    }

    #[tokio::test]
    async fn point_lookup_without_status_is_enriched() {
        let store = Arc::new(MemoryStore::new());
        let author = store.add_author("Ada");
        let head = store.add_section_head("Rosa", None);
        let paper =
            store.add_paper_with_status(author.id, PaperStatus::UnderReview, Utc::now());
        assign(&store, paper.id, head.id).await;

        let view = composer(store.clone())
            .papers_by_status(None, Some(paper.id), Page::default())
            .await
            .unwrap();
        assert_eq!(view.papers.len(), 1);
        let assigned = view.papers[0].assigned_to.as_ref().unwrap();
        assert_eq!(assigned.len(), 1);
        assert_eq!(assigned[0].id, head.id);
    }

    #[tokio::test]
    async fn empty_status_page_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        let err = composer(store)
            .papers_by_status(Some("rejected"), None, Page::default())
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::NotFound(_)));
    }

    #[tokio::test]
    async fn zero_assignments_is_an_empty_queue_not_an_error() {
        let store = Arc::new(MemoryStore::new());
        let head = store.add_section_head("Rosa", None);

        let queue = composer(store)
            .assigned_papers_for_section_head(head.id, None, Page::default())
            .await
            .unwrap();
        assert_eq!(queue.section_head.total_assigned_papers, 0);
        assert!(queue.assigned_papers.is_empty());
    }

    #[tokio::test]
    async fn queue_carries_reviewer_status_per_paper() {
        let store = Arc::new(MemoryStore::new());
        let author = store.add_author("Ada");
        let head = store.add_section_head("Rosa", None);
        let paper =
            store.add_paper_with_status(author.id, PaperStatus::UnderReview, Utc::now());
        assign(&store, paper.id, head.id).await;

        let queue = composer(store.clone())
            .assigned_papers_for_section_head(head.id, Some("assigned"), Page::default())
            .await
            .unwrap();
        assert_eq!(queue.assigned_papers.len(), 1);
        assert_eq!(queue.assigned_papers[0].id, paper.id);
        assert_eq!(
            queue.assigned_papers[0].reviewer_status,
            ReviewStatus::Assigned
        );

        let err = composer(store)
            .assigned_papers_for_section_head(head.id, Some("maybe"), Page::default())
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn unknown_section_head_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        let err = composer(store)
            .assigned_papers_for_section_head(42, None, Page::default())
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::NotFound(_)));
    }

    #[tokio::test]
    async fn pagination_math() {
        // total=25, limit=10, offset=20 -> totalPages=3, currentPage=3.
        let meta = PageMeta::new(25, Page::new(20, 10));
        assert_eq!(meta.total_pages, 3);
        assert_eq!(meta.current_page, 3);
    }

    #[tokio::test]
    async fn author_search_joins_owner_fields() {
        let store = Arc::new(MemoryStore::new());
        let ada = store.seed_user(crate::domain::NewUser {
            title: Some("Prof".into()),
            country: None,
            first_name: "Ada".into(),
            last_name: Some("Lovelace".into()),
            specialization: None,
            affiliation: None,
            email: "ada@example.org".into(),
            phone: None,
            role: crate::domain::Role::Author,
        });
        let bob = store.add_author("Bob");
        store.add_paper(ada.id);
        store.add_paper(bob.id);

        let view = composer(store.clone())
            .papers_for_author(
                AuthorPaperFilter {
                    name: Some("lovel".into()),
                    ..Default::default()
                },
                Page::default(),
            )
            .await
            .unwrap();
        assert_eq!(view.pagination.total, 1);
        assert_eq!(view.papers[0].user_id, ada.id);

        let err = composer(store)
            .papers_for_author(
                AuthorPaperFilter {
                    name: Some("nobody".into()),
                    ..Default::default()
                },
                Page::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::NotFound(_)));
    }

    #[tokio::test]
    async fn public_listing_splits_on_the_thirty_day_cutoff() {
        let store = Arc::new(MemoryStore::new());
        let author = store.add_author("Ada");
        let old = store.add_paper_with_status(
            author.id,
            PaperStatus::Published,
            Utc::now() - Duration::days(60),
        );
        let recent =
            store.add_paper_with_status(author.id, PaperStatus::Published, Utc::now());
        // Unpublished papers never appear.
        store.add_paper(author.id);

        let vc = composer(store);

        let all = vc.public_papers(None, Page::default()).await.unwrap();
        assert_eq!(all.pagination.total, 2);

        let archive = vc
            .public_papers(Some("archive"), Page::default())
            .await
            .unwrap();
        assert_eq!(archive.papers.len(), 1);
        assert_eq!(archive.papers[0].id, old.id);

        let in_press = vc
            .public_papers(Some("inPress"), Page::default())
            .await
            .unwrap();
        assert_eq!(in_press.papers.len(), 1);
        assert_eq!(in_press.papers[0].id, recent.id);

        assert!(matches!(
            vc.public_papers(Some("latest"), Page::default())
                .await
                .unwrap_err(),
            WorkflowError::InvalidInput(_)
        ));
    }
}
