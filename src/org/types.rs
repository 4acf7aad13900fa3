/// Organization, membership, and user type definitions

use serde::{Deserialize, Serialize};

/// An organization, optionally annotated with derived counts at read time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_by: Option<String>,
    pub created_at: String,
    pub updated_at: String,

    /// Derived at read time, never stored
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub member_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflow_count: Option<usize>,
}

/// Membership row; (organization_id, user_id) is the natural key
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrgMember {
    #[serde(default)]
    pub id: Option<String>,
    pub organization_id: String,
    pub user_id: String,
    pub role: String,
    pub joined_at: String,
}

/// Membership enriched with the member's display fields
#[derive(Debug, Clone, Serialize)]
pub struct MemberProfile {
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub role: String,
    pub joined_at: String,
}

/// A user profile, created implicitly on first sight
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Payload for creating an organization
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewOrganization {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Partial organization update
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrganizationPatch {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Partial user-profile update
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserProfilePatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
    pub phone: Option<String>,
}
