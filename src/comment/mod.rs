/// Comments on workflows and steps
///
/// A comment is anchored to a workflow and/or a step. Only the author may
/// update or delete a comment; the ownership check lives here at the
/// service boundary, not in the API layer.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::activity::{ActivityAction, ActivityEvent, ActivityLedger, EntityKind};
use crate::error::AppError;
use crate::store::{now_utc, tables, EntityStore};
use crate::workflow::Workflow;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    #[serde(default)]
    pub workflow_id: Option<String>,
    #[serde(default)]
    pub step_id: Option<String>,
    #[serde(default)]
    pub created_by: Option<String>,
    pub content: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Payload for creating a comment
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewComment {
    #[serde(default)]
    pub workflow_id: Option<String>,
    #[serde(default)]
    pub step_id: Option<String>,
    #[serde(default)]
    pub content: String,
}

/// Partial comment update
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommentPatch {
    pub content: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CommentService {
    store: EntityStore,
    ledger: ActivityLedger,
}

impl CommentService {
    pub fn new(store: EntityStore, ledger: ActivityLedger) -> Self {
        Self { store, ledger }
    }

    pub async fn create(
        &self,
        new: NewComment,
        created_by: Option<&str>,
    ) -> Result<Comment, AppError> {
        if new.content.trim().is_empty() {
            return Err(AppError::Validation("comment content is required".to_string()));
        }
        if new.workflow_id.is_none() && new.step_id.is_none() {
            return Err(AppError::Validation(
                "comment must reference a workflow or a step".to_string(),
            ));
        }

        // A workflow anchor must point at a live workflow; also yields the
        // organization scope for the ledger entry
        let mut organization_id = None;
        if let Some(workflow_id) = new.workflow_id.as_deref() {
            let Some(workflow) = self
                .store
                .get::<Workflow>(tables::WORKFLOWS, workflow_id)
                .await?
            else {
                return Err(AppError::NotFound("Workflow"));
            };
            organization_id = workflow.organization_id;
        }

        let payload = json!({
            "workflow_id": new.workflow_id,
            "step_id": new.step_id,
            "created_by": created_by,
            "content": new.content,
        });

        let comment: Comment = self.store.insert_one(tables::COMMENTS, payload).await?;

        self.ledger
            .record(ActivityEvent {
                organization_id,
                workflow_id: comment.workflow_id.clone(),
                user_id: created_by.map(str::to_string),
                entity_type: EntityKind::Comment,
                entity_id: comment.id.clone(),
                action: ActivityAction::Created,
                details: "Added a comment".to_string(),
            })
            .await;

        Ok(comment)
    }

    pub async fn get(&self, id: &str) -> Result<Option<Comment>, AppError> {
        Ok(self.store.get(tables::COMMENTS, id).await?)
    }

    /// Comments newest first; both filters optional, AND-combined
    pub async fn list(
        &self,
        workflow_id: Option<&str>,
        step_id: Option<&str>,
    ) -> Result<Vec<Comment>, AppError> {
        let mut filters: Vec<(&str, &str)> = Vec::new();
        if let Some(workflow_id) = workflow_id {
            filters.push(("workflow_id", workflow_id));
        }
        if let Some(step_id) = step_id {
            filters.push(("step_id", step_id));
        }

        Ok(self
            .store
            .list(tables::COMMENTS, &filters, Some("created_at.desc"))
            .await?)
    }

    pub async fn update(
        &self,
        id: &str,
        patch: CommentPatch,
        actor: &str,
    ) -> Result<Comment, AppError> {
        let Some(existing) = self.store.get::<Comment>(tables::COMMENTS, id).await? else {
            return Err(AppError::NotFound("Comment"));
        };
        self.ensure_author(&existing, actor, "update")?;

        let mut payload = Map::new();
        payload.insert("updated_at".to_string(), json!(now_utc()));
        if let Some(content) = patch.content {
            if content.trim().is_empty() {
                return Err(AppError::Validation("comment content is required".to_string()));
            }
            payload.insert("content".to_string(), json!(content));
        }

        let updated: Vec<Comment> = self
            .store
            .update(tables::COMMENTS, &[("id", id)], Value::Object(payload))
            .await?;
        let Some(comment) = updated.into_iter().next() else {
            return Err(AppError::NotFound("Comment"));
        };

        self.ledger
            .record(ActivityEvent {
                organization_id: self.workflow_org(comment.workflow_id.as_deref()).await,
                workflow_id: comment.workflow_id.clone(),
                user_id: Some(actor.to_string()),
                entity_type: EntityKind::Comment,
                entity_id: comment.id.clone(),
                action: ActivityAction::Updated,
                details: "Updated a comment".to_string(),
            })
            .await;

        Ok(comment)
    }

    pub async fn delete(&self, id: &str, actor: &str) -> Result<(), AppError> {
        let Some(existing) = self.store.get::<Comment>(tables::COMMENTS, id).await? else {
            return Err(AppError::NotFound("Comment"));
        };
        self.ensure_author(&existing, actor, "delete")?;

        self.store.delete(tables::COMMENTS, &[("id", id)]).await?;

        self.ledger
            .record(ActivityEvent {
                organization_id: self.workflow_org(existing.workflow_id.as_deref()).await,
                workflow_id: existing.workflow_id.clone(),
                user_id: Some(actor.to_string()),
                entity_type: EntityKind::Comment,
                entity_id: existing.id.clone(),
                action: ActivityAction::Deleted,
                details: "Deleted a comment".to_string(),
            })
            .await;

        Ok(())
    }

    fn ensure_author(&self, comment: &Comment, actor: &str, verb: &str) -> Result<(), AppError> {
        if comment.created_by.as_deref() != Some(actor) {
            return Err(AppError::Forbidden(format!(
                "not authorized to {verb} this comment"
            )));
        }
        Ok(())
    }

    /// Organization scope for ledger entries, best-effort
    async fn workflow_org(&self, workflow_id: Option<&str>) -> Option<String> {
        let workflow_id = workflow_id?;
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
    use crate::workflow::{NewWorkflow, WorkflowService};

    fn services() -> (CommentService, WorkflowService) {
        let store = EntityStore::new(Arc::new(InMemoryRowStore::new()));
        let ledger = ActivityLedger::new(store.clone());
        (
            CommentService::new(store.clone(), ledger.clone()),
            WorkflowService::new(store, ledger),
        )
    }

    async fn workflow(workflows: &WorkflowService) -> String {
        workflows
            .create(
                NewWorkflow {
                    title: "Onboarding".to_string(),
                    ..NewWorkflow::default()
                },
                None,
            )
            .await
            .unwrap()
            .id
    }

    fn anchored(workflow_id: &str, content: &str) -> NewComment {
        NewComment {
            workflow_id: Some(workflow_id.to_string()),
            step_id: None,
            content: content.to_string(),
        }
    }

    #[tokio::test]
    async fn create_rejects_blank_content() {
        let (comments, workflows) = services();
        let wf = workflow(&workflows).await;
        let result = comments.create(anchored(&wf, "  "), Some("user-1")).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn create_rejects_unanchored_comments() {
        let (comments, _) = services();
        let result = comments
            .create(
                NewComment {
                    content: "floating".to_string(),
                    ..NewComment::default()
                },
                Some("user-1"),
            )
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn create_checks_the_workflow_anchor() {
        let (comments, _) = services();
        let result = comments
            .create(anchored("missing", "hello"), Some("user-1"))
            .await;
        assert!(matches!(result, Err(AppError::NotFound("Workflow"))));
    }

    #[tokio::test]
    async fn only_the_author_may_update_or_delete() {
        let (comments, workflows) = services();
        let wf = workflow(&workflows).await;
        let comment = comments
            .create(anchored(&wf, "mine"), Some("author"))
            .await
            .unwrap();

        let update = comments
            .update(
                &comment.id,
                CommentPatch {
                    content: Some("edited".to_string()),
                },
                "someone-else",
            )
            .await;
        assert!(matches!(update, Err(AppError::Forbidden(_))));

        let delete = comments.delete(&comment.id, "someone-else").await;
        assert!(matches!(delete, Err(AppError::Forbidden(_))));

        let edited = comments
            .update(
                &comment.id,
                CommentPatch {
                    content: Some("edited".to_string()),
                },
                "author",
            )
            .await
            .unwrap();
        assert_eq!(edited.content, "edited");

        comments.delete(&comment.id, "author").await.unwrap();
        assert!(comments.get(&comment.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_filters_are_and_combined() {
        let (comments, workflows) = services();
        let wf = workflow(&workflows).await;

        comments
            .create(
                NewComment {
                    workflow_id: Some(wf.clone()),
                    step_id: Some("step-1".to_string()),
                    content: "on step".to_string(),
                },
                Some("user-1"),
            )
            .await
            .unwrap();
        comments
            .create(anchored(&wf, "on workflow"), Some("user-1"))
            .await
            .unwrap();

        let all = comments.list(Some(&wf), None).await.unwrap();
        assert_eq!(all.len(), 2);

        let stepped = comments.list(Some(&wf), Some("step-1")).await.unwrap();
        assert_eq!(stepped.len(), 1);
        assert_eq!(stepped[0].content, "on step");
    }
}
