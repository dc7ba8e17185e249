//! End-to-end workflow scenario against the in-memory store: an author
//! submits, the chief editor assigns two section heads, one section head
//! accepts, and the chief editor publishes.

use std::sync::Arc;

use peer_review_core::{
    AssignmentManager, LifecycleEngine, MemoryStore, NullNotifier, Page, PaperStatus,
    ReviewStatus, ViewComposer,
};

#[tokio::test]
async fn submission_to_publication() {
    let store = Arc::new(MemoryStore::new());
    let author = store.add_author("Ada");
    let editor = store.add_chief_editor("Eve");
    let head_a = store.add_section_head("Rosa", Some("Klein"));
    let head_b = store.add_section_head("Ines", None);

    let assignments = AssignmentManager::new(store.clone(), Arc::new(NullNotifier));
    let engine = LifecycleEngine::new(store.clone(), assignments.clone());
    let views = ViewComposer::new(store.clone());

    // Author submits.
    let paper = engine
        .submit_paper(author.id, MemoryStore::sample_draft())
        .await
        .unwrap();
    assert_eq!(paper.paper_status, PaperStatus::Submitted);

    // Chief editor assigns two section heads.
    let paper = engine
        .transition_paper_status(
            paper.id,
            editor.id,
            "assigned",
            Some("please review".into()),
            None,
            Some(vec![head_a.id, head_b.id]),
        )
        .await
        .unwrap();
    assert_eq!(paper.paper_status, PaperStatus::UnderReview);

    let listed = assignments
        .list(Default::default(), Page::default())
        .await
        .unwrap();
    assert_eq!(listed.pagination.total, 2);
    assert!(listed
        .assignments
        .iter()
        .all(|a| a.status == ReviewStatus::Assigned));

    // First section head accepts; the paper itself stays under review.
    let accepted = engine
        .record_section_head_decision(paper.id, head_a.id, "accepted", None, None)
        .await
        .unwrap();
    assert_eq!(accepted.status, ReviewStatus::Accepted);

    let queue = views
        .assigned_papers_for_section_head(head_a.id, None, Page::default())
        .await
        .unwrap();
    assert_eq!(queue.section_head.total_assigned_papers, 1);
    assert_eq!(
        queue.assigned_papers[0].reviewer_status,
        ReviewStatus::Accepted
    );
    assert_eq!(
        queue.assigned_papers[0].paper_status,
        PaperStatus::UnderReview
    );

    // Chief editor publishes.
    let paper = engine
        .transition_paper_status(paper.id, editor.id, "acceptAndPublish", None, None, None)
        .await
        .unwrap();
    assert_eq!(paper.paper_status, PaperStatus::Published);

    // Ledger reads submitted -> underReview -> published, in order.
    let statuses: Vec<PaperStatus> = paper
        .status_history
        .iter()
        .map(|entry| entry.status)
        .collect();
    assert_eq!(
        statuses,
        vec![
            PaperStatus::Submitted,
            PaperStatus::UnderReview,
            PaperStatus::Published
        ]
    );

    // The published paper now shows up on the public listing.
    let public = views.public_papers(None, Page::default()).await.unwrap();
    assert_eq!(public.pagination.total, 1);
    assert_eq!(public.papers[0].id, paper.id);
}
