/// Workflow and step mutation/query service
///
/// Every workflow/step write in the system goes through here: the service
/// combines row-store CRUD with activity-ledger records and derived-field
/// maintenance (step counts, append ordering, completion stamps). The API
/// layer never writes rows directly.

use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::activity::{ActivityAction, ActivityEvent, ActivityLedger, EntityKind};
use crate::ai::GeneratedWorkflow;
use crate::error::AppError;
use crate::store::{now_utc, tables, EntityStore};

use super::types::{NewStep, NewWorkflow, Step, StepPatch, StepStatus, Workflow, WorkflowPatch};

#[derive(Debug, Clone)]
pub struct WorkflowService {
    store: EntityStore,
    ledger: ActivityLedger,
}

impl WorkflowService {
    pub fn new(store: EntityStore, ledger: ActivityLedger) -> Self {
        Self { store, ledger }
    }

    // ===== workflows =====

    pub async fn create(
        &self,
        new: NewWorkflow,
        created_by: Option<&str>,
    ) -> Result<Workflow, AppError> {
        if new.title.trim().is_empty() {
            return Err(AppError::Validation("workflow title is required".to_string()));
        }

        let payload = json!({
            "title": new.title,
            "description": new.description.unwrap_or_default(),
            "status": new.status.unwrap_or_default(),
            "organization_id": new.organization_id,
            "created_by": created_by,
        });

        let workflow: Workflow = self.store.insert_one(tables::WORKFLOWS, payload).await?;

        self.ledger
            .record(ActivityEvent {
                organization_id: workflow.organization_id.clone(),
                workflow_id: Some(workflow.id.clone()),
                user_id: created_by.map(str::to_string),
                entity_type: EntityKind::Workflow,
                entity_id: workflow.id.clone(),
                action: ActivityAction::Created,
                details: format!("Created workflow '{}'", workflow.title),
            })
            .await;

        tracing::info!("Created workflow: {} ({})", workflow.id, workflow.title);

        Ok(workflow)
    }

    /// Single workflow with its steps and step count attached
    pub async fn get(&self, id: &str) -> Result<Option<Workflow>, AppError> {
        let Some(mut workflow) = self.store.get::<Workflow>(tables::WORKFLOWS, id).await? else {
            return Ok(None);
        };

        workflow.steps = self.list_steps(id).await?;
        workflow.step_count = Some(workflow.steps.len());

        Ok(Some(workflow))
    }

    /// List workflows, newest-updated first, each annotated with its steps
    /// and step count
    ///
    /// The organization filter is lenient: blank or non-UUID input is
    /// ignored rather than rejected, so a garbled filter still returns the
    /// full listing.
    pub async fn list(&self, org_filter: Option<&str>) -> Result<Vec<Workflow>, AppError> {
        let effective = org_filter
            .map(str::trim)
            .filter(|s| Uuid::parse_str(s).is_ok());

        let mut filters: Vec<(&str, &str)> = Vec::new();
        if let Some(org) = effective {
            filters.push(("organization_id", org));
        }

        let mut workflows: Vec<Workflow> = self
            .store
            .list(tables::WORKFLOWS, &filters, Some("updated_at.desc"))
            .await?;

        for workflow in &mut workflows {
            workflow.steps = self.list_steps(&workflow.id).await?;
            workflow.step_count = Some(workflow.steps.len());
        }

        Ok(workflows)
    }

    pub async fn update(
        &self,
        id: &str,
        patch: WorkflowPatch,
        updated_by: Option<&str>,
    ) -> Result<Workflow, AppError> {
        let mut payload = Map::new();
        payload.insert("updated_at".to_string(), json!(now_utc()));

        if let Some(title) = patch.title {
            if title.trim().is_empty() {
                return Err(AppError::Validation("workflow title is required".to_string()));
            }
            payload.insert("title".to_string(), json!(title));
        }
        if let Some(description) = patch.description {
            payload.insert("description".to_string(), json!(description));
        }
        if let Some(status) = patch.status {
            payload.insert("status".to_string(), json!(status));
        }

        let updated: Vec<Workflow> = self
            .store
            .update(tables::WORKFLOWS, &[("id", id)], Value::Object(payload))
            .await?;
        let Some(workflow) = updated.into_iter().next() else {
            return Err(AppError::NotFound("Workflow"));
        };

        self.ledger
            .record(ActivityEvent {
                organization_id: workflow.organization_id.clone(),
                workflow_id: Some(workflow.id.clone()),
                user_id: updated_by.map(str::to_string),
                entity_type: EntityKind::Workflow,
                entity_id: workflow.id.clone(),
                action: ActivityAction::Updated,
                details: format!("Updated workflow '{}'", workflow.title),
            })
            .await;

        Ok(workflow)
    }

    /// Delete a workflow and everything hanging off it
    ///
    /// Cascade order is comments, then steps, then the workflow row. The
    /// store offers no transactions; any failure mid-cascade surfaces
    /// immediately so the caller sees the inconsistency instead of a
    /// silent retry.
    pub async fn delete(&self, id: &str, deleted_by: Option<&str>) -> Result<(), AppError> {
        // Capture the row first; the ledger entry must outlive it
        let Some(workflow) = self.store.get::<Workflow>(tables::WORKFLOWS, id).await? else {
            return Err(AppError::NotFound("Workflow"));
        };

        self.store
            .delete(tables::COMMENTS, &[("workflow_id", id)])
            .await?;
        self.store
            .delete(tables::WORKFLOW_STEPS, &[("workflow_id", id)])
            .await?;
        self.store.delete(tables::WORKFLOWS, &[("id", id)]).await?;

        self.ledger
            .record(ActivityEvent {
                organization_id: workflow.organization_id.clone(),
                workflow_id: None,
                user_id: deleted_by.map(str::to_string),
                entity_type: EntityKind::Workflow,
                entity_id: id.to_string(),
                action: ActivityAction::Deleted,
                details: format!("Deleted workflow '{}'", workflow.title),
            })
            .await;

        tracing::info!("Deleted workflow: {}", id);

        Ok(())
    }

    // ===== steps =====

    pub async fn create_step(
        &self,
        new: NewStep,
        created_by: Option<&str>,
    ) -> Result<Step, AppError> {
        let Some(workflow) = self
            .store
            .get::<Workflow>(tables::WORKFLOWS, &new.workflow_id)
            .await?
        else {
            return Err(AppError::NotFound("Workflow"));
        };
        if new.title.trim().is_empty() {
            return Err(AppError::Validation("step title is required".to_string()));
        }

        // Append semantics: a step without an explicit order slots in after
        // the workflow's existing steps
        let step_order = match new.order {
            Some(order) => order,
            None => self.list_steps(&new.workflow_id).await?.len() as i64,
        };

        let payload = json!({
            "workflow_id": new.workflow_id,
            "title": new.title,
            "description": new.description.unwrap_or_default(),
            "status": new.status.unwrap_or_default(),
            "assigned_to": new.assigned_to,
            "role": new.role,
            "step_order": step_order,
            "completed_at": null,
            "completed_by": null,
        });

        let step: Step = self.store.insert_one(tables::WORKFLOW_STEPS, payload).await?;

        self.ledger
            .record(ActivityEvent {
                organization_id: workflow.organization_id.clone(),
                workflow_id: Some(step.workflow_id.clone()),
                user_id: created_by.map(str::to_string),
                entity_type: EntityKind::Step,
                entity_id: step.id.clone(),
                action: ActivityAction::Created,
                details: format!("Added step '{}'", step.title),
            })
            .await;

        Ok(step)
    }

    pub async fn get_step(&self, id: &str) -> Result<Option<Step>, AppError> {
        Ok(self.store.get(tables::WORKFLOW_STEPS, id).await?)
    }

    /// Steps of a workflow in display order (ascending `step_order`,
    /// insertion-order ties)
    pub async fn list_steps(&self, workflow_id: &str) -> Result<Vec<Step>, AppError> {
        Ok(self
            .store
            .list(
                tables::WORKFLOW_STEPS,
                &[("workflow_id", workflow_id)],
                Some("step_order.asc"),
            )
            .await?)
    }

    pub async fn update_step(
        &self,
        id: &str,
        patch: StepPatch,
        updated_by: Option<&str>,
    ) -> Result<Step, AppError> {
        let mut payload = Map::new();
        payload.insert("updated_at".to_string(), json!(now_utc()));

        if let Some(title) = patch.title {
            if title.trim().is_empty() {
                return Err(AppError::Validation("step title is required".to_string()));
            }
            payload.insert("title".to_string(), json!(title));
        }
        if let Some(description) = patch.description {
            payload.insert("description".to_string(), json!(description));
        }
        if let Some(status) = patch.status {
            payload.insert("status".to_string(), json!(status));
        }
        if let Some(assigned_to) = patch.assigned_to {
            payload.insert("assigned_to".to_string(), json!(assigned_to));
        }
        if let Some(step_order) = patch.step_order {
            payload.insert("step_order".to_string(), json!(step_order));
        }

        let updated: Vec<Step> = self
            .store
            .update(tables::WORKFLOW_STEPS, &[("id", id)], Value::Object(payload))
            .await?;
        let Some(step) = updated.into_iter().next() else {
            return Err(AppError::NotFound("Step"));
        };

        self.ledger
            .record(ActivityEvent {
                organization_id: self.workflow_org(&step.workflow_id).await,
                workflow_id: Some(step.workflow_id.clone()),
                user_id: updated_by.map(str::to_string),
                entity_type: EntityKind::Step,
                entity_id: step.id.clone(),
                action: ActivityAction::Updated,
                details: format!("Updated step '{}'", step.title),
            })
            .await;

        Ok(step)
    }

    /// Dedicated status transition
    ///
    /// The first transition into `completed` stamps `completed_at` and
    /// `completed_by`. Re-completing an already-completed step keeps the
    /// original stamps, and moving away from `completed` does NOT clear
    /// them: completion history is preserved.
    pub async fn set_step_status(
        &self,
        id: &str,
        status: StepStatus,
        actor: Option<&str>,
    ) -> Result<Step, AppError> {
        let Some(current) = self.store.get::<Step>(tables::WORKFLOW_STEPS, id).await? else {
            return Err(AppError::NotFound("Step"));
        };

        let mut payload = Map::new();
        payload.insert("status".to_string(), json!(status));
        payload.insert("updated_at".to_string(), json!(now_utc()));
        if status == StepStatus::Completed && current.status != StepStatus::Completed {
            payload.insert("completed_at".to_string(), json!(now_utc()));
            payload.insert("completed_by".to_string(), json!(actor));
        }

        let updated: Vec<Step> = self
            .store
            .update(tables::WORKFLOW_STEPS, &[("id", id)], Value::Object(payload))
            .await?;
        let Some(step) = updated.into_iter().next() else {
            return Err(AppError::NotFound("Step"));
        };

        let action = if status == StepStatus::Completed {
            ActivityAction::Completed
        } else {
            ActivityAction::Updated
        };

        self.ledger
            .record(ActivityEvent {
                organization_id: self.workflow_org(&step.workflow_id).await,
                workflow_id: Some(step.workflow_id.clone()),
                user_id: actor.map(str::to_string),
                entity_type: EntityKind::Step,
                entity_id: step.id.clone(),
                action,
                details: format!("Step '{}' marked as {}", step.title, status.as_str()),
            })
            .await;

        Ok(step)
    }

    pub async fn delete_step(&self, id: &str, deleted_by: Option<&str>) -> Result<(), AppError> {
        let Some(step) = self.store.get::<Step>(tables::WORKFLOW_STEPS, id).await? else {
            return Err(AppError::NotFound("Step"));
        };

        self.store
            .delete(tables::WORKFLOW_STEPS, &[("id", id)])
            .await?;

        self.ledger
            .record(ActivityEvent {
                organization_id: self.workflow_org(&step.workflow_id).await,
                workflow_id: Some(step.workflow_id.clone()),
                user_id: deleted_by.map(str::to_string),
                entity_type: EntityKind::Step,
                entity_id: step.id.clone(),
                action: ActivityAction::Deleted,
                details: format!("Deleted step '{}'", step.title),
            })
            .await;

        Ok(())
    }

    /// Persist a generated workflow through the normal mutation paths so
    /// every created entity leaves its own ledger entry
    pub async fn import_generated(
        &self,
        generated: GeneratedWorkflow,
        organization_id: Option<&str>,
        created_by: Option<&str>,
    ) -> Result<Workflow, AppError> {
        let workflow = self
            .create(
                NewWorkflow {
                    title: generated.title,
                    description: generated.description,
                    organization_id: organization_id.map(str::to_string),
                    status: None,
                },
                created_by,
            )
            .await?;

        for (index, step) in generated.steps.into_iter().enumerate() {
            self.create_step(
                NewStep {
                    workflow_id: workflow.id.clone(),
                    title: step.title,
                    description: step.description,
                    status: None,
                    assigned_to: None,
                    role: step.role,
                    order: Some(index as i64),
                },
                created_by,
            )
            .await?;
        }

        self.get(&workflow.id)
            .await?
            .ok_or(AppError::NotFound("Workflow"))
    }

    /// Organization scope for step ledger entries; lookup is best-effort
    /// because it only enriches the audit trail
    async fn workflow_org(&self, workflow_id: &str) -> Option<String> {
        match self.store.get::<Workflow>(tables::WORKFLOWS, workflow_id).await {
            Ok(Some(workflow)) => workflow.organization_id,
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::store::InMemoryRowStore;
    use crate::workflow::types::WorkflowStatus;

    fn service() -> (WorkflowService, ActivityLedger) {
        let store = EntityStore::new(Arc::new(InMemoryRowStore::new()));
        let ledger = ActivityLedger::new(store.clone());
        (WorkflowService::new(store, ledger.clone()), ledger)
    }

    fn new_workflow(title: &str) -> NewWorkflow {
        NewWorkflow {
            title: title.to_string(),
            ..NewWorkflow::default()
        }
    }

    fn new_step(workflow_id: &str, title: &str) -> NewStep {
        NewStep {
            workflow_id: workflow_id.to_string(),
            title: title.to_string(),
            ..NewStep::default()
        }
    }

    #[tokio::test]
    async fn create_defaults_to_draft() {
        let (service, _) = service();
        let workflow = service
            .create(new_workflow("Onboarding"), Some("user-1"))
            .await
            .unwrap();

        assert_eq!(workflow.status, WorkflowStatus::Draft);
        assert_eq!(workflow.created_by.as_deref(), Some("user-1"));
        assert!(workflow.organization_id.is_none());
    }

    #[tokio::test]
    async fn create_rejects_blank_title() {
        let (service, _) = service();
        let result = service.create(new_workflow("   "), None).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn every_mutation_leaves_exactly_one_ledger_entry() {
        let (service, ledger) = service();

        let workflow = service
            .create(new_workflow("Onboarding"), Some("user-1"))
            .await
            .unwrap();
        assert_eq!(ledger.list(None, None, None).await.unwrap().len(), 1);

        service
            .update(
                &workflow.id,
                WorkflowPatch {
                    description: Some("refreshed".to_string()),
                    ..WorkflowPatch::default()
                },
                Some("user-1"),
            )
            .await
            .unwrap();
        assert_eq!(ledger.list(None, None, None).await.unwrap().len(), 2);

        service.delete(&workflow.id, Some("user-1")).await.unwrap();
        assert_eq!(ledger.list(None, None, None).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn update_missing_workflow_is_not_found() {
        let (service, _) = service();
        let result = service
            .update("missing", WorkflowPatch::default(), None)
            .await;
        assert!(matches!(result, Err(AppError::NotFound("Workflow"))));
    }

    #[tokio::test]
    async fn steps_append_in_creation_order() {
        let (service, _) = service();
        let workflow = service.create(new_workflow("Onboarding"), None).await.unwrap();

        let first = service
            .create_step(new_step(&workflow.id, "Send welcome email"), None)
            .await
            .unwrap();
        let second = service
            .create_step(new_step(&workflow.id, "Assign buddy"), None)
            .await
            .unwrap();

        assert_eq!(first.step_order, 0);
        assert_eq!(second.step_order, 1);

        let listed = service.list_steps(&workflow.id).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].title, "Send welcome email");
        assert_eq!(listed[1].title, "Assign buddy");
    }

    #[tokio::test]
    async fn create_step_requires_live_workflow() {
        let (service, _) = service();
        let result = service.create_step(new_step("missing", "orphan"), None).await;
        assert!(matches!(result, Err(AppError::NotFound("Workflow"))));
    }

    #[tokio::test]
    async fn completing_a_step_stamps_actor_and_time() {
        let (service, _) = service();
        let workflow = service.create(new_workflow("Onboarding"), None).await.unwrap();
        let step = service
            .create_step(new_step(&workflow.id, "Send welcome email"), None)
            .await
            .unwrap();

        let completed = service
            .set_step_status(&step.id, StepStatus::Completed, Some("user-42"))
            .await
            .unwrap();

        assert_eq!(completed.status, StepStatus::Completed);
        assert_eq!(completed.completed_by.as_deref(), Some("user-42"));
        assert!(completed.completed_at.is_some());
    }

    #[tokio::test]
    async fn recompleting_keeps_the_first_actor() {
        let (service, _) = service();
        let workflow = service.create(new_workflow("Onboarding"), None).await.unwrap();
        let step = service
            .create_step(new_step(&workflow.id, "Send welcome email"), None)
            .await
            .unwrap();

        service
            .set_step_status(&step.id, StepStatus::Completed, Some("user-42"))
            .await
            .unwrap();
        let again = service
            .set_step_status(&step.id, StepStatus::Completed, Some("user-99"))
            .await
            .unwrap();

        assert_eq!(again.completed_by.as_deref(), Some("user-42"));
    }

    #[tokio::test]
    async fn leaving_completed_preserves_completion_history() {
        let (service, _) = service();
        let workflow = service.create(new_workflow("Onboarding"), None).await.unwrap();
        let step = service
            .create_step(new_step(&workflow.id, "Send welcome email"), None)
            .await
            .unwrap();

        service
            .set_step_status(&step.id, StepStatus::Completed, Some("user-42"))
            .await
            .unwrap();
        let reopened = service
            .set_step_status(&step.id, StepStatus::Pending, Some("user-7"))
            .await
            .unwrap();

        assert_eq!(reopened.status, StepStatus::Pending);
        assert_eq!(reopened.completed_by.as_deref(), Some("user-42"));
        assert!(reopened.completed_at.is_some());
    }

    #[tokio::test]
    async fn completion_action_is_completed_otherwise_updated() {
        let (service, ledger) = service();
        let workflow = service.create(new_workflow("Onboarding"), None).await.unwrap();
        let step = service
            .create_step(new_step(&workflow.id, "Send welcome email"), None)
            .await
            .unwrap();

        service
            .set_step_status(&step.id, StepStatus::Blocked, Some("user-1"))
            .await
            .unwrap();
        service
            .set_step_status(&step.id, StepStatus::Completed, Some("user-1"))
            .await
            .unwrap();

        let entries = ledger.list(None, None, None).await.unwrap();
        let actions: Vec<ActivityAction> = entries
            .iter()
            .filter(|e| e.entity_id == step.id)
            .map(|e| e.action)
            .collect();
        assert!(actions.contains(&ActivityAction::Completed));
        assert!(actions.contains(&ActivityAction::Updated));
    }

    #[tokio::test]
    async fn lenient_org_filter_ignores_garbage() {
        let (service, _) = service();
        service.create(new_workflow("A"), None).await.unwrap();
        service.create(new_workflow("B"), None).await.unwrap();

        let all = service.list(None).await.unwrap();
        assert_eq!(all.len(), 2);

        let with_garbage = service.list(Some("not-a-valid-id")).await.unwrap();
        assert_eq!(with_garbage.len(), 2);

        let with_blank = service.list(Some("   ")).await.unwrap();
        assert_eq!(with_blank.len(), 2);
    }

    #[tokio::test]
    async fn list_annotates_step_counts() {
        let (service, _) = service();
        let workflow = service.create(new_workflow("Onboarding"), None).await.unwrap();
        service
            .create_step(new_step(&workflow.id, "one"), None)
            .await
            .unwrap();

        let listed = service.list(None).await.unwrap();
        assert_eq!(listed[0].step_count, Some(1));
        assert_eq!(listed[0].steps.len(), 1);
    }
}
