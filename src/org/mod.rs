/// Organization Management Layer
///
/// Organizations, their memberships, and user profiles. Membership lists
/// and per-organization counts are derived at read time from the store.

// Organization, membership, and user type definitions
pub mod types;

// Organization and user services
pub mod service;

// Re-export commonly used types
pub use service::{OrgService, UserService};
pub use types::{
    MemberProfile, NewOrganization, Organization, OrganizationPatch, OrgMember, User,
    UserProfilePatch,
};
