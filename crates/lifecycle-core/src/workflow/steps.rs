//! Review pipeline definitions and the derived step projection

use lifecycle_types::{DocumentWorkflow, StepDefinition, StepState, StepView};
use once_cell::sync::Lazy;

static DEFAULT_PIPELINE: Lazy<Vec<StepDefinition>> = Lazy::new(|| {
    vec![
        StepDefinition::new(1, "Upload"),
        StepDefinition::new(2, "Review"),
        StepDefinition::new(3, "Approve"),
        StepDefinition::new(4, "Finalize"),
    ]
});

/// The standard four-step review pipeline
pub fn default_pipeline() -> Vec<StepDefinition> {
    DEFAULT_PIPELINE.clone()
}

/// Build a pipeline from configured step names; index order is step order
pub fn pipeline_from_names(names: &[String]) -> Vec<StepDefinition> {
    names
        .iter()
        .enumerate()
        .map(|(index, name)| StepDefinition::new(index as u32 + 1, name))
        .collect()
}

/// Project the pipeline against a workflow's `current_step`
///
/// Pure function: a step is complete below the current step, current at it,
/// upcoming above it.
pub fn project_steps(
    workflow: &DocumentWorkflow,
    definitions: &[StepDefinition],
) -> Vec<StepView> {
    definitions
        .iter()
        .map(|definition| {
            let state = if definition.number < workflow.current_step {
                StepState::Complete
            } else if definition.number == workflow.current_step {
                StepState::Current
            } else {
                StepState::Upcoming
            };
            StepView {
                number: definition.number,
                name: definition.name.clone(),
                state,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use lifecycle_types::{DocumentId, TemplateId, WorkflowId, WorkflowStatus};

    fn workflow_at_step(current_step: u32) -> DocumentWorkflow {
        DocumentWorkflow {
            id: WorkflowId::generate(),
            template_id: TemplateId::new("audit-review"),
            document_id: DocumentId::generate(),
            current_step,
            status: WorkflowStatus::InProgress,
            started_at: Utc::now(),
            completed_at: None,
            timeout_at: None,
            execution_history: Vec::new(),
        }
    }

    #[test]
    fn test_projection_splits_around_current_step() {
        let views = project_steps(&workflow_at_step(3), &default_pipeline());

        assert_eq!(views.len(), 4);
        assert_eq!(views[0].state, StepState::Complete);
        assert_eq!(views[1].state, StepState::Complete);
        assert_eq!(views[2].state, StepState::Current);
        assert_eq!(views[2].name, "Approve");
        assert_eq!(views[3].state, StepState::Upcoming);
    }

    #[test]
    fn test_projection_at_first_step() {
        let views = project_steps(&workflow_at_step(1), &default_pipeline());

        assert_eq!(views[0].state, StepState::Current);
        assert!(views[1..].iter().all(|v| v.state == StepState::Upcoming));
    }

    #[test]
    fn test_pipeline_from_names_numbers_from_one() {
        let names = vec!["Intake".to_string(), "Sign-off".to_string()];
        let pipeline = pipeline_from_names(&names);

        assert_eq!(pipeline.len(), 2);
        assert_eq!(pipeline[0].number, 1);
        assert_eq!(pipeline[0].name, "Intake");
        assert_eq!(pipeline[1].number, 2);
        assert_eq!(pipeline[1].name, "Sign-off");
    }
}
