/// HTTP API Layer
///
/// REST endpoints for workflows, steps, comments, organizations, users,
/// activity logs, and the AI converter. Route builders return
/// `Router<AppState>`; every handler resolves the request `Principal` and
/// answers with the `{"success": true, ...}` envelope.

// Workflow management endpoints
pub mod workflows;

// Step management endpoints, including the status transition
pub mod steps;

// Comment endpoints with author-only mutation
pub mod comments;

// Organization and membership endpoints
pub mod organizations;

// User profile endpoints
pub mod users;

// Activity log listing
pub mod activities;

// AI text-to-workflow conversion endpoints
pub mod ai;

use crate::activity::ActivityLedger;
use crate::ai::SopGenerator;
use crate::comment::CommentService;
use crate::org::{OrgService, UserService};
use crate::workflow::WorkflowService;

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    /// Workflow and step mutations/queries
    pub workflows: WorkflowService,
    /// Comment mutations/queries
    pub comments: CommentService,
    /// Organization and membership management
    pub orgs: OrgService,
    /// User profile management
    pub users: UserService,
    /// Append-only audit trail
    pub activity: ActivityLedger,
    /// Text-to-workflow generator
    pub generator: SopGenerator,
}
