mod common;

use chrono::{Duration, Utc};
use common::{in_progress_workflow, MockDocumentService};
use lifecycle_core::LifecycleFacade;
use lifecycle_types::{ActorId, DocumentId, StepState, WorkflowAction, WorkflowStatus};
use std::sync::Arc;

#[tokio::test]
async fn test_workflow_view_projects_steps_around_current() {
    let service = Arc::new(MockDocumentService::new());
    let document_id = DocumentId::new("doc-view");

    let mut workflow = in_progress_workflow(&document_id);
    workflow.current_step = 2;
    service.seed_workflow(workflow).await;

    let facade = LifecycleFacade::with_default_pipeline(service);
    let view = facade.workflow_view(&document_id).await.unwrap().unwrap();

    assert_eq!(view.steps.len(), 4);
    assert_eq!(view.steps[0].name, "Upload");
    assert_eq!(view.steps[0].state, StepState::Complete);
    assert_eq!(view.steps[1].name, "Review");
    assert_eq!(view.steps[1].state, StepState::Current);
    assert_eq!(view.steps[2].state, StepState::Upcoming);
    assert_eq!(view.steps[3].state, StepState::Upcoming);
    assert!(view.history().is_empty());
}

#[tokio::test]
async fn test_workflow_view_none_without_workflow() {
    let service = Arc::new(MockDocumentService::new());
    let document_id = DocumentId::new("doc-empty");
    service.register_document(&document_id).await;

    let facade = LifecycleFacade::with_default_pipeline(service);
    let view = facade.workflow_view(&document_id).await.unwrap();
    assert!(view.is_none());
}

#[tokio::test]
async fn test_workflow_view_survives_completion() {
    let service = Arc::new(MockDocumentService::new());
    let document_id = DocumentId::new("doc-finished");

    let mut workflow = in_progress_workflow(&document_id);
    workflow.current_step = 4;
    service.seed_workflow(workflow).await;

    let facade = LifecycleFacade::with_default_pipeline(service);
    facade
        .submit_workflow_action(
            &document_id,
            WorkflowAction::Approve,
            Some(4),
            ActorId::new("auditor-1"),
            None,
        )
        .await
        .unwrap();

    // A finished review still renders: view falls back to the terminal run
    let view = facade.workflow_view(&document_id).await.unwrap().unwrap();
    assert_eq!(view.workflow.status, WorkflowStatus::Completed);
    assert_eq!(view.history().len(), 1);
}

#[tokio::test]
async fn test_multiple_active_workflows_pick_most_recent() {
    let service = Arc::new(MockDocumentService::new());
    let document_id = DocumentId::new("doc-anomaly");

    let mut older = in_progress_workflow(&document_id);
    older.started_at = Utc::now() - Duration::hours(3);
    let newer = in_progress_workflow(&document_id);
    let newer_id = newer.id.clone();

    service.seed_workflow(older).await;
    service.seed_workflow(newer).await;

    let facade = LifecycleFacade::with_default_pipeline(service);
    let view = facade.workflow_view(&document_id).await.unwrap().unwrap();

    assert_eq!(view.workflow.id, newer_id);
}

#[tokio::test]
async fn test_view_reflects_action_immediately() {
    let service = Arc::new(MockDocumentService::new());
    let document_id = DocumentId::new("doc-ryw");
    service.seed_workflow(in_progress_workflow(&document_id)).await;

    let facade = LifecycleFacade::with_default_pipeline(service);

    facade
        .submit_workflow_action(
            &document_id,
            WorkflowAction::Approve,
            Some(1),
            ActorId::new("auditor-1"),
            None,
        )
        .await
        .unwrap();

    // Read-your-writes: the view right after the action shows the advance
    let view = facade.workflow_view(&document_id).await.unwrap().unwrap();
    assert_eq!(view.workflow.current_step, 2);
    assert_eq!(view.history().len(), 1);
    assert_eq!(view.steps[0].state, StepState::Complete);
    assert_eq!(view.steps[1].state, StepState::Current);
}
