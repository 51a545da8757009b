//! Project memberships
//!
//! `project_user` and `project_group` associate one existing principal with a
//! project and a set of roles. Both are driven by the same templated endpoint,
//! differing only in the principal segment. The same endpoint family backs the
//! nested `member` / `group` blocks of a project.

use super::validation::{validate_not_empty, validate_project_key};
use super::{Resource, ResourceData};
use crate::api::{expand_path, AccessClient};
use crate::error::{ImportIdError, ValidationError};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

const MEMBERSHIP_URL: &str = "access/api/v1/projects/{projectKey}/{kind}/{name}";
const MEMBERSHIPS_URL: &str = "access/api/v1/projects/{projectKey}/{kind}";

/// Separator between project key and principal name in membership ids
pub const ID_SEPARATOR: char = ':';

/// Which kind of principal a membership refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrincipalKind {
    User,
    Group,
}

impl PrincipalKind {
    /// Path segment below the project endpoint
    pub fn segment(self) -> &'static str {
        match self {
            PrincipalKind::User => "users",
            PrincipalKind::Group => "groups",
        }
    }

    /// Name of the nested block on a project
    pub fn block_name(self) -> &'static str {
        match self {
            PrincipalKind::User => "member",
            PrincipalKind::Group => "group",
        }
    }
}

/// Wire shape of a membership, also used for nested `member` / `group` blocks.
/// Roles are kept sorted so state stays stable across reads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    pub name: String,
    #[serde(default)]
    pub roles: BTreeSet<String>,
}

impl Membership {
    pub fn new<I, S>(name: impl Into<String>, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct MembershipList {
    #[serde(default)]
    members: Vec<Membership>,
}

/// Declarative attributes of a standalone membership resource
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipData {
    pub project_key: String,
    pub name: String,
    #[serde(default)]
    pub roles: BTreeSet<String>,
}

impl MembershipData {
    /// `"{project_key}:{name}"`
    pub fn id(&self) -> String {
        format_id(&self.project_key, &self.name)
    }
}

pub fn format_id(project_key: &str, name: &str) -> String {
    format!("{}{}{}", project_key, ID_SEPARATOR, name)
}

/// Split an import id into `(project_key, name)`
pub fn parse_id(id: &str) -> Result<(&str, &str), ImportIdError> {
    match id.split_once(ID_SEPARATOR) {
        Some((project_key, name)) if !project_key.is_empty() && !name.is_empty() => {
            Ok((project_key, name))
        }
        _ => Err(ImportIdError { id: id.to_string() }),
    }
}

pub fn pack_membership(project_key: &str, membership: Membership) -> MembershipData {
    MembershipData {
        project_key: project_key.to_string(),
        name: membership.name,
        roles: membership.roles,
    }
}

pub fn unpack_membership(data: &MembershipData) -> Result<Membership, ValidationError> {
    validate_project_key("project_key", &data.project_key)?;
    validate_not_empty("name", &data.name)?;
    if data.roles.is_empty() {
        return Err(ValidationError::new("roles", "at least one role is required"));
    }

    Ok(Membership {
        name: data.name.clone(),
        roles: data.roles.clone(),
    })
}

/// `project_user` or `project_group`
#[derive(Debug, Clone, Copy)]
pub struct MembershipResource {
    kind: PrincipalKind,
}

impl MembershipResource {
    pub const fn users() -> Self {
        Self {
            kind: PrincipalKind::User,
        }
    }

    pub const fn groups() -> Self {
        Self {
            kind: PrincipalKind::Group,
        }
    }

    fn path(&self, project_key: &str, name: &str) -> Result<String> {
        expand_path(
            MEMBERSHIP_URL,
            &[
                ("projectKey", project_key),
                ("kind", self.kind.segment()),
                ("name", name),
            ],
        )
    }

    /// Idempotent create-or-replace of one membership
    pub async fn put(&self, client: &AccessClient, project_key: &str, membership: &Membership) -> Result<()> {
        let path = self.path(project_key, &membership.name)?;
        client.put(&path, membership).await.with_context(|| {
            format!(
                "Failed to save {} {} in project {}",
                self.kind.block_name(),
                membership.name,
                project_key
            )
        })?;
        Ok(())
    }

    /// Remove one membership
    pub async fn remove(&self, client: &AccessClient, project_key: &str, name: &str) -> Result<()> {
        let path = self.path(project_key, name)?;
        client.delete(&path).await.with_context(|| {
            format!(
                "Failed to remove {} {} from project {}",
                self.kind.block_name(),
                name,
                project_key
            )
        })?;
        Ok(())
    }

    /// All memberships of this kind in a project, sorted by name
    pub async fn list(&self, client: &AccessClient, project_key: &str) -> Result<Vec<Membership>> {
        let path = expand_path(
            MEMBERSHIPS_URL,
            &[("projectKey", project_key), ("kind", self.kind.segment())],
        )?;

        let list: Option<MembershipList> = client.get(&path).await.with_context(|| {
            format!("Failed to list {} of project {}", self.kind.segment(), project_key)
        })?;

        let mut members = list.unwrap_or_default().members;
        members.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(members)
    }

    /// Bring the memberships of a project in line with `desired`.
    ///
    /// New or changed entries are PUT, entries missing from `desired` are
    /// deleted, unchanged entries cost no request.
    pub async fn reconcile(&self, client: &AccessClient, project_key: &str, desired: &[Membership]) -> Result<()> {
        let current: BTreeMap<String, BTreeSet<String>> = self
            .list(client, project_key)
            .await?
            .into_iter()
            .map(|m| (m.name, m.roles))
            .collect();

        for membership in desired {
            if current.get(&membership.name) == Some(&membership.roles) {
                continue;
            }
            tracing::info!(
                "Assigning {} {} to project {} with roles {:?}",
                self.kind.block_name(),
                membership.name,
                project_key,
                membership.roles
            );
            self.put(client, project_key, membership).await?;
        }

        for name in current.keys() {
            if desired.iter().any(|m| &m.name == name) {
                continue;
            }
            tracing::info!(
                "Removing {} {} from project {}",
                self.kind.block_name(),
                name,
                project_key
            );
            self.remove(client, project_key, name).await?;
        }

        Ok(())
    }

    async fn upsert(&self, client: &AccessClient, data: &mut ResourceData<MembershipData>) -> Result<()> {
        let membership = unpack_membership(&data.attributes)?;
        let project_key = data.attributes.project_key.clone();

        self.put(client, &project_key, &membership).await?;

        data.set_id(data.attributes.id());
        self.read(client, data).await
    }
}

impl Resource for MembershipResource {
    type Attributes = MembershipData;

    const TYPE_NAME: &'static str = "project_membership";

    async fn create(&self, client: &AccessClient, data: &mut ResourceData<MembershipData>) -> Result<()> {
        tracing::info!("Creating project {} {}", self.kind.block_name(), data.attributes.id());
        self.upsert(client, data).await
    }

    async fn read(&self, client: &AccessClient, data: &mut ResourceData<MembershipData>) -> Result<()> {
        let project_key = data.attributes.project_key.clone();
        let path = self.path(&project_key, &data.attributes.name)?;

        let loaded: Membership = client.get(&path).await.with_context(|| {
            format!(
                "Failed to read {} {} in project {}",
                self.kind.block_name(),
                data.attributes.name,
                project_key
            )
        })?;

        // The response does not carry the project key
        data.attributes = pack_membership(&project_key, loaded);
        Ok(())
    }

    async fn update(&self, client: &AccessClient, data: &mut ResourceData<MembershipData>) -> Result<()> {
        tracing::info!("Updating project {} {}", self.kind.block_name(), data.attributes.id());
        self.upsert(client, data).await
    }

    async fn delete(&self, client: &AccessClient, data: &mut ResourceData<MembershipData>) -> Result<()> {
        let project_key = data.attributes.project_key.clone();
        let name = data.attributes.name.clone();

        self.remove(client, &project_key, &name).await?;

        data.clear_id();
        Ok(())
    }

    fn import(&self, id: &str) -> Result<ResourceData<MembershipData>> {
        let (project_key, name) = parse_id(id)?;

        Ok(ResourceData::with_id(
            id,
            MembershipData {
                project_key: project_key.to_string(),
                name: name.to_string(),
                roles: BTreeSet::new(),
            },
        ))
    }

    fn validate(&self, config: &MembershipData) -> Result<()> {
        unpack_membership(config)?;
        Ok(())
    }

    fn requires_replace(&self, prior: &MembershipData, planned: &MembershipData) -> bool {
        prior.project_key != planned.project_key || prior.name != planned.name
    }
}
