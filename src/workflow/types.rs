/// Core workflow and step type definitions
///
/// Workflows are named, ordered procedures composed of steps; both carry a
/// lifecycle status. These types are the row representations exchanged with
/// the store, plus the patch/new shapes the mutation paths accept.

use serde::{Deserialize, Serialize};

/// Workflow lifecycle status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    #[default]
    Draft,
    Published,
    Archived,
}

/// Step lifecycle status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Blocked,
}

impl StepStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            StepStatus::Pending => "pending",
            StepStatus::InProgress => "in_progress",
            StepStatus::Completed => "completed",
            StepStatus::Blocked => "blocked",
        }
    }
}

/// A workflow as stored, optionally annotated by the projection layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    pub id: String,
    /// Workflows may exist unattached to any organization
    #[serde(default)]
    pub organization_id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: WorkflowStatus,
    #[serde(default)]
    pub created_by: Option<String>,
    pub created_at: String,
    pub updated_at: String,

    /// Derived at read time, never stored on the row
    #[serde(default)]
    pub steps: Vec<Step>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_count: Option<usize>,
}

/// One ordered unit of work within a workflow
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    pub id: String,
    pub workflow_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: StepStatus,
    #[serde(default)]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    /// Display sequence; not required unique, ties break by creation order
    #[serde(default)]
    pub step_order: i64,
    /// Set on the transition into `completed` and preserved afterwards
    #[serde(default)]
    pub completed_at: Option<String>,
    #[serde(default)]
    pub completed_by: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Payload for creating a workflow
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewWorkflow {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "org_id")]
    pub organization_id: Option<String>,
    #[serde(default)]
    pub status: Option<WorkflowStatus>,
}

/// Payload for creating a step
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewStep {
    #[serde(default)]
    pub workflow_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<StepStatus>,
    #[serde(default)]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub order: Option<i64>,
}

/// Partial workflow update; absent fields (and explicit nulls) leave the
/// stored value unchanged
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkflowPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<WorkflowStatus>,
}

/// Partial step update, same contract as `WorkflowPatch`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StepPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<StepStatus>,
    pub assigned_to: Option<String>,
    #[serde(alias = "order")]
    pub step_order: Option<i64>,
}
