/// Organization, membership, and user services
///
/// Organizations own workflows and members. Member and workflow counts are
/// derived at read time, never stored. Membership uniqueness on the
/// (organization, user) natural key is the backing store's job; the
/// orchestrator does not re-check it.

use std::collections::HashSet;

use serde_json::{json, Map, Value};

use crate::error::AppError;
use crate::store::{now_utc, tables, EntityStore};
use crate::workflow::Workflow;

use super::types::{
    MemberProfile, NewOrganization, Organization, OrganizationPatch, OrgMember, User,
    UserProfilePatch,
};

#[derive(Debug, Clone)]
pub struct OrgService {
    store: EntityStore,
}

impl OrgService {
    pub fn new(store: EntityStore) -> Self {
        Self { store }
    }

    /// Create an organization; the creator is auto-enrolled as an admin
    /// member
    pub async fn create(
        &self,
        new: NewOrganization,
        created_by: Option<&str>,
    ) -> Result<Organization, AppError> {
        if new.name.trim().is_empty() {
            return Err(AppError::Validation("organization name is required".to_string()));
        }

        let payload = json!({
            "name": new.name,
            "description": new.description.unwrap_or_default(),
            "created_by": created_by,
        });

        let org: Organization = self.store.insert_one(tables::ORGANIZATIONS, payload).await?;

        if let Some(owner) = created_by {
            self.add_member(&org.id, owner, "admin").await?;
        }

        tracing::info!("Created organization: {} ({})", org.id, org.name);

        Ok(org)
    }

    pub async fn get(&self, org_id: &str) -> Result<Option<Organization>, AppError> {
        let Some(mut org) = self
            .store
            .get::<Organization>(tables::ORGANIZATIONS, org_id)
            .await?
        else {
            return Ok(None);
        };

        self.annotate(&mut org).await?;

        Ok(Some(org))
    }

    /// List organizations, newest first; restricted to the user's
    /// memberships when a user is given
    pub async fn list(&self, user_id: Option<&str>) -> Result<Vec<Organization>, AppError> {
        let mut orgs: Vec<Organization> = self
            .store
            .list(tables::ORGANIZATIONS, &[], Some("created_at.desc"))
            .await?;

        if let Some(user) = user_id {
            let memberships: Vec<OrgMember> = self
                .store
                .list(tables::ORGANIZATION_MEMBERS, &[("user_id", user)], None)
                .await?;
            let member_of: HashSet<String> = memberships
                .into_iter()
                .map(|m| m.organization_id)
                .collect();
            orgs.retain(|org| member_of.contains(&org.id));
        }

        for org in &mut orgs {
            self.annotate(org).await?;
        }

        Ok(orgs)
    }

    pub async fn update(
        &self,
        org_id: &str,
        patch: OrganizationPatch,
    ) -> Result<Organization, AppError> {
        let mut payload = Map::new();
        payload.insert("updated_at".to_string(), json!(now_utc()));
        if let Some(name) = patch.name {
            if name.trim().is_empty() {
                return Err(AppError::Validation("organization name is required".to_string()));
            }
            payload.insert("name".to_string(), json!(name));
        }
        if let Some(description) = patch.description {
            payload.insert("description".to_string(), json!(description));
        }

        let updated: Vec<Organization> = self
            .store
            .update(tables::ORGANIZATIONS, &[("id", org_id)], Value::Object(payload))
            .await?;

        updated
            .into_iter()
            .next()
            .ok_or(AppError::NotFound("Organization"))
    }

    /// Members of an organization enriched with user display fields
    ///
    /// Enrichment is best-effort: a membership whose user row is missing
    /// gets placeholder fields, never an error.
    pub async fn members(&self, org_id: &str) -> Result<Vec<MemberProfile>, AppError> {
        let members: Vec<OrgMember> = self
            .store
            .list(
                tables::ORGANIZATION_MEMBERS,
                &[("organization_id", org_id)],
                Some("joined_at.desc"),
            )
            .await?;

        let mut profiles = Vec::with_capacity(members.len());
        for member in members {
            let user = self.store.get::<User>(tables::USERS, &member.user_id).await?;
            let (name, email) = match user {
                Some(user) => (
                    user.name.unwrap_or_else(|| "User".to_string()),
                    user.email.unwrap_or_default(),
                ),
                None => ("User".to_string(), String::new()),
            };
            profiles.push(MemberProfile {
                user_id: member.user_id,
                name,
                email,
                role: member.role,
                joined_at: member.joined_at,
            });
        }

        Ok(profiles)
    }

    pub async fn add_member(
        &self,
        org_id: &str,
        user_id: &str,
        role: &str,
    ) -> Result<OrgMember, AppError> {
        let payload = json!({
            "organization_id": org_id,
            "user_id": user_id,
            "role": role,
            "joined_at": now_utc(),
        });

        Ok(self
            .store
            .insert_one(tables::ORGANIZATION_MEMBERS, payload)
            .await?)
    }

    pub async fn remove_member(&self, org_id: &str, user_id: &str) -> Result<(), AppError> {
        let matches = [("organization_id", org_id), ("user_id", user_id)];
        let existing: Vec<OrgMember> = self
            .store
            .list(tables::ORGANIZATION_MEMBERS, &matches, None)
            .await?;
        if existing.is_empty() {
            return Err(AppError::NotFound("Member"));
        }

        self.store
            .delete(tables::ORGANIZATION_MEMBERS, &matches)
            .await?;

        Ok(())
    }

    pub async fn update_member_role(
        &self,
        org_id: &str,
        user_id: &str,
        role: &str,
    ) -> Result<OrgMember, AppError> {
        let updated: Vec<OrgMember> = self
            .store
            .update(
                tables::ORGANIZATION_MEMBERS,
                &[("organization_id", org_id), ("user_id", user_id)],
                json!({ "role": role }),
            )
            .await?;

        updated.into_iter().next().ok_or(AppError::NotFound("Member"))
    }

    async fn annotate(&self, org: &mut Organization) -> Result<(), AppError> {
        let members: Vec<OrgMember> = self
            .store
            .list(
                tables::ORGANIZATION_MEMBERS,
                &[("organization_id", &org.id)],
                None,
            )
            .await?;
        let workflows: Vec<Workflow> = self
            .store
            .list(tables::WORKFLOWS, &[("organization_id", &org.id)], None)
            .await?;

        org.member_count = Some(members.len());
        org.workflow_count = Some(workflows.len());

        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct UserService {
    store: EntityStore,
}

impl UserService {
    pub fn new(store: EntityStore) -> Self {
        Self { store }
    }

    pub async fn get(&self, user_id: &str) -> Result<Option<User>, AppError> {
        Ok(self.store.get(tables::USERS, user_id).await?)
    }

    /// Insert on first sight, otherwise partial profile patch
    pub async fn upsert(
        &self,
        user_id: &str,
        patch: UserProfilePatch,
    ) -> Result<User, AppError> {
        let existing = self.store.get::<User>(tables::USERS, user_id).await?;

        match existing {
            Some(existing) => {
                let mut payload = Map::new();
                payload.insert("updated_at".to_string(), json!(now_utc()));
                if let Some(name) = patch.name {
                    payload.insert("name".to_string(), json!(name));
                }
                if let Some(email) = patch.email {
                    payload.insert("email".to_string(), json!(email));
                }
                if let Some(avatar_url) = patch.avatar_url {
                    payload.insert("avatar_url".to_string(), json!(avatar_url));
                }
                if let Some(phone) = patch.phone {
                    payload.insert("phone".to_string(), json!(phone));
                }

                let updated: Vec<User> = self
                    .store
                    .update(tables::USERS, &[("id", user_id)], Value::Object(payload))
                    .await?;

                Ok(updated.into_iter().next().unwrap_or(existing))
            }
            None => {
                let payload = json!({
                    "id": user_id,
                    "email": patch.email.unwrap_or_default(),
                    "name": patch.name.unwrap_or_default(),
                    "avatar_url": patch.avatar_url,
                    "phone": patch.phone,
                });

                Ok(self.store.insert_one(tables::USERS, payload).await?)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::store::InMemoryRowStore;

    fn services() -> (OrgService, UserService, EntityStore) {
        let store = EntityStore::new(Arc::new(InMemoryRowStore::new()));
        (
            OrgService::new(store.clone()),
            UserService::new(store.clone()),
            store,
        )
    }

    fn new_org(name: &str) -> NewOrganization {
        NewOrganization {
            name: name.to_string(),
            ..NewOrganization::default()
        }
    }

    #[tokio::test]
    async fn creator_is_enrolled_as_admin() {
        let (orgs, _, _) = services();
        let org = orgs.create(new_org("Acme"), Some("owner-1")).await.unwrap();

        let members = orgs.members(&org.id).await.unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].user_id, "owner-1");
        assert_eq!(members[0].role, "admin");
    }

    #[tokio::test]
    async fn create_rejects_blank_name() {
        let (orgs, _, _) = services();
        let result = orgs.create(new_org("  "), None).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn list_restricts_to_memberships() {
        let (orgs, _, _) = services();
        let mine = orgs.create(new_org("Mine"), Some("me")).await.unwrap();
        orgs.create(new_org("Theirs"), Some("them")).await.unwrap();

        let listed = orgs.list(Some("me")).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, mine.id);

        let everything = orgs.list(None).await.unwrap();
        assert_eq!(everything.len(), 2);
    }

    #[tokio::test]
    async fn counts_are_derived_at_read_time() {
        let (orgs, _, store) = services();
        let org = orgs.create(new_org("Acme"), Some("owner-1")).await.unwrap();
        orgs.add_member(&org.id, "user-2", "member").await.unwrap();
        store
            .insert_one::<Workflow>(
                tables::WORKFLOWS,
                json!({"title": "wf", "organization_id": org.id}),
            )
            .await
            .unwrap();

        let fetched = orgs.get(&org.id).await.unwrap().unwrap();
        assert_eq!(fetched.member_count, Some(2));
        assert_eq!(fetched.workflow_count, Some(1));
    }

    #[tokio::test]
    async fn missing_user_rows_get_placeholder_fields() {
        let (orgs, users, _) = services();
        let org = orgs.create(new_org("Acme"), Some("ghost")).await.unwrap();

        let members = orgs.members(&org.id).await.unwrap();
        assert_eq!(members[0].name, "User");
        assert_eq!(members[0].email, "");

        users
            .upsert(
                "ghost",
                UserProfilePatch {
                    name: Some("Casper".to_string()),
                    email: Some("casper@example.com".to_string()),
                    ..UserProfilePatch::default()
                },
            )
            .await
            .unwrap();

        let members = orgs.members(&org.id).await.unwrap();
        assert_eq!(members[0].name, "Casper");
        assert_eq!(members[0].email, "casper@example.com");
    }

    #[tokio::test]
    async fn membership_mutations_require_the_pair() {
        let (orgs, _, _) = services();
        let org = orgs.create(new_org("Acme"), Some("owner-1")).await.unwrap();

        let remove = orgs.remove_member(&org.id, "nobody").await;
        assert!(matches!(remove, Err(AppError::NotFound("Member"))));

        let promote = orgs.update_member_role(&org.id, "nobody", "admin").await;
        assert!(matches!(promote, Err(AppError::NotFound("Member"))));

        let demoted = orgs
            .update_member_role(&org.id, "owner-1", "member")
            .await
            .unwrap();
        assert_eq!(demoted.role, "member");

        orgs.remove_member(&org.id, "owner-1").await.unwrap();
        assert!(orgs.members(&org.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn upsert_creates_then_patches() {
        let (_, users, _) = services();

        let created = users
            .upsert(
                "user-1",
                UserProfilePatch {
                    email: Some("a@example.com".to_string()),
                    ..UserProfilePatch::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(created.email.as_deref(), Some("a@example.com"));

        let patched = users
            .upsert(
                "user-1",
                UserProfilePatch {
                    name: Some("Ada".to_string()),
                    ..UserProfilePatch::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(patched.name.as_deref(), Some("Ada"));
        // Fields not in the patch stay put
        assert_eq!(patched.email.as_deref(), Some("a@example.com"));
    }
}
