//! Access Projects
//!
//! The `project` resource: a namespacing, quota and permission boundary
//! keyed by a short lowercase key. Nested `member` and `group` blocks manage
//! the project's user and group memberships together with the project.

use super::membership::{Membership, MembershipResource};
use super::units::{bytes_to_gigabytes, gigabytes_to_bytes, suppress_storage_diff, UNLIMITED};
use super::validation::{
    validate_display_name, validate_membership_blocks, validate_project_key, validate_storage_quota,
};
use super::{Resource, ResourceData};
use crate::api::{expand_path, AccessClient};
use crate::error::ValidationError;
use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

const PROJECTS_URL: &str = "/access/api/v1/projects/";
const PROJECT_URL: &str = "/access/api/v1/projects/{id}";

/// Admin privileges as sent to and returned by the API
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminPrivileges {
    #[serde(default)]
    pub manage_members: bool,
    #[serde(default)]
    pub manage_resources: bool,
    #[serde(default)]
    pub index_resources: bool,
}

/// Project as sent to and returned by the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Project {
    #[serde(rename = "project_key")]
    pub key: String,
    pub display_name: String,
    pub description: String,
    pub admin_privileges: Option<AdminPrivileges>,
    /// Bytes, or -1 for unlimited
    #[serde(rename = "storage_quota_bytes")]
    pub storage_quota: i64,
    pub soft_limit: bool,
    #[serde(rename = "storage_quota_email_notification")]
    pub quota_email_notification: bool,
}

impl Default for Project {
    fn default() -> Self {
        Self {
            key: String::new(),
            display_name: String::new(),
            description: String::new(),
            admin_privileges: None,
            storage_quota: UNLIMITED,
            soft_limit: false,
            quota_email_notification: false,
        }
    }
}

/// The `admin_privileges` block as written in configuration.
/// A block with no flag set is "present but empty".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminPrivilegesBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manage_members: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manage_resources: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_resources: Option<bool>,
}

impl AdminPrivilegesBlock {
    pub fn is_empty(&self) -> bool {
        self.manage_members.is_none() && self.manage_resources.is_none() && self.index_resources.is_none()
    }
}

impl From<AdminPrivileges> for AdminPrivilegesBlock {
    fn from(privileges: AdminPrivileges) -> Self {
        Self {
            manage_members: Some(privileges.manage_members),
            manage_resources: Some(privileges.manage_resources),
            index_resources: Some(privileges.index_resources),
        }
    }
}

impl TryFrom<AdminPrivilegesBlock> for AdminPrivileges {
    type Error = ValidationError;

    fn try_from(block: AdminPrivilegesBlock) -> Result<Self, Self::Error> {
        let required = |flag: Option<bool>, name: &str| {
            flag.ok_or_else(|| ValidationError::new(format!("admin_privileges.{}", name), "is required"))
        };

        Ok(Self {
            manage_members: required(block.manage_members, "manage_members")?,
            manage_resources: required(block.manage_resources, "manage_resources")?,
            index_resources: required(block.index_resources, "index_resources")?,
        })
    }
}

fn default_storage() -> i64 {
    UNLIMITED
}

/// Declarative attributes of a `project`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectData {
    pub key: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_privileges: Option<AdminPrivilegesBlock>,
    #[serde(default = "default_storage")]
    pub max_storage_in_gigabytes: i64,
    #[serde(default)]
    pub block_deployments_on_limit: bool,
    #[serde(default)]
    pub email_notification: bool,
    #[serde(default, rename = "member", skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<Membership>,
    #[serde(default, rename = "group", skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<Membership>,
}

impl Default for ProjectData {
    fn default() -> Self {
        Self {
            key: String::new(),
            display_name: String::new(),
            description: None,
            admin_privileges: None,
            max_storage_in_gigabytes: UNLIMITED,
            block_deployments_on_limit: false,
            email_notification: false,
            members: Vec::new(),
            groups: Vec::new(),
        }
    }
}

/// Validate configuration and build the API body.
///
/// Returns `Ok(None)` when `admin_privileges` is present but empty: nothing is
/// sent for such a configuration and no error is raised.
pub fn unpack_project(data: &ProjectData) -> Result<Option<Project>, ValidationError> {
    validate_project_key("key", &data.key)?;
    validate_display_name(&data.display_name)?;
    validate_storage_quota(data.max_storage_in_gigabytes)?;
    validate_membership_blocks(
        "member",
        data.members.iter().map(|m| (m.name.as_str(), m.roles.len())),
    )?;
    validate_membership_blocks(
        "group",
        data.groups.iter().map(|g| (g.name.as_str(), g.roles.len())),
    )?;

    let admin_privileges = match data.admin_privileges {
        Some(block) if block.is_empty() => return Ok(None),
        Some(block) => Some(AdminPrivileges::try_from(block)?),
        None => None,
    };

    Ok(Some(Project {
        key: data.key.clone(),
        display_name: data.display_name.clone(),
        description: data.description.clone().unwrap_or_default(),
        admin_privileges,
        storage_quota: gigabytes_to_bytes(data.max_storage_in_gigabytes),
        soft_limit: data.block_deployments_on_limit,
        quota_email_notification: data.email_notification,
    }))
}

/// Map an API project and its memberships back into declarative state
pub fn pack_project(project: Project, members: Vec<Membership>, groups: Vec<Membership>) -> ProjectData {
    ProjectData {
        key: project.key,
        display_name: project.display_name,
        description: Some(project.description).filter(|d| !d.is_empty()),
        admin_privileges: project.admin_privileges.map(AdminPrivilegesBlock::from),
        max_storage_in_gigabytes: bytes_to_gigabytes(project.storage_quota),
        block_deployments_on_limit: project.soft_limit,
        email_notification: project.quota_email_notification,
        members,
        groups,
    }
}

fn project_path(id: &str) -> Result<String> {
    expand_path(PROJECT_URL, &[("id", id)])
}

/// The `project` resource
#[derive(Debug, Clone, Copy, Default)]
pub struct ProjectResource;

impl ProjectResource {
    /// Whether a project with this key exists (HEAD, 404 means absent)
    pub async fn exists(&self, client: &AccessClient, id: &str) -> Result<bool> {
        let status = client
            .head(&project_path(id)?)
            .await
            .with_context(|| format!("Failed to check project {}", id))?;

        if status.is_success() {
            Ok(true)
        } else if status == StatusCode::NOT_FOUND {
            Ok(false)
        } else {
            Err(anyhow::anyhow!("Unexpected status {} checking project {}", status, id))
        }
    }

    async fn sync_memberships(&self, client: &AccessClient, data: &ProjectData) -> Result<()> {
        MembershipResource::users()
            .reconcile(client, &data.key, &data.members)
            .await?;
        MembershipResource::groups()
            .reconcile(client, &data.key, &data.groups)
            .await
    }
}

impl Resource for ProjectResource {
    type Attributes = ProjectData;

    const TYPE_NAME: &'static str = "project";

    async fn create(&self, client: &AccessClient, data: &mut ResourceData<ProjectData>) -> Result<()> {
        let Some(project) = unpack_project(&data.attributes)? else {
            tracing::warn!("Project {} has an empty admin_privileges block; nothing to create", data.attributes.key);
            return Ok(());
        };

        tracing::info!("Creating project {}", project.key);
        client
            .post(PROJECTS_URL, &project)
            .await
            .with_context(|| format!("Failed to create project {}", project.key))?;

        data.set_id(project.key.clone());

        self.sync_memberships(client, &data.attributes).await?;
        self.read(client, data).await
    }

    async fn read(&self, client: &AccessClient, data: &mut ResourceData<ProjectData>) -> Result<()> {
        let id = data.require_id(Self::TYPE_NAME)?.to_string();

        let project: Project = client
            .get(&project_path(&id)?)
            .await
            .with_context(|| format!("Failed to read project {}", id))?;

        let members = MembershipResource::users().list(client, &id).await?;
        let groups = MembershipResource::groups().list(client, &id).await?;

        data.attributes = pack_project(project, members, groups);
        Ok(())
    }

    async fn update(&self, client: &AccessClient, data: &mut ResourceData<ProjectData>) -> Result<()> {
        let id = data.require_id(Self::TYPE_NAME)?.to_string();

        let Some(project) = unpack_project(&data.attributes)? else {
            tracing::warn!("Project {} has an empty admin_privileges block; nothing to update", id);
            return Ok(());
        };

        tracing::info!("Updating project {}", id);
        client
            .put(&project_path(&id)?, &project)
            .await
            .with_context(|| format!("Failed to update project {}", id))?;

        data.set_id(project.key.clone());

        self.sync_memberships(client, &data.attributes).await?;
        self.read(client, data).await
    }

    async fn delete(&self, client: &AccessClient, data: &mut ResourceData<ProjectData>) -> Result<()> {
        let id = data.require_id(Self::TYPE_NAME)?.to_string();

        tracing::info!("Deleting project {}", id);
        client
            .delete(&project_path(&id)?)
            .await
            .with_context(|| format!("Failed to delete project {}", id))?;

        data.clear_id();
        Ok(())
    }

    fn import(&self, id: &str) -> Result<ResourceData<ProjectData>> {
        Ok(ResourceData::with_id(
            id,
            ProjectData {
                key: id.to_string(),
                ..ProjectData::default()
            },
        ))
    }

    fn validate(&self, config: &ProjectData) -> Result<()> {
        unpack_project(config)?;
        Ok(())
    }

    fn is_noop(&self, config: &ProjectData) -> bool {
        config.admin_privileges.is_some_and(|block| block.is_empty())
    }

    fn normalize(&self, mut config: ProjectData) -> ProjectData {
        config.members.sort_by(|a, b| a.name.cmp(&b.name));
        config.groups.sort_by(|a, b| a.name.cmp(&b.name));
        config
    }

    fn requires_replace(&self, prior: &ProjectData, planned: &ProjectData) -> bool {
        prior.key != planned.key
    }

    fn suppress_diff(&self, attribute: &str, old: &str, new: &str) -> bool {
        attribute == "max_storage_in_gigabytes" && suppress_storage_diff(old, new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_data() -> ProjectData {
        ProjectData {
            key: "abc".to_string(),
            display_name: "My Project".to_string(),
            description: Some("test description".to_string()),
            admin_privileges: Some(AdminPrivilegesBlock {
                manage_members: Some(true),
                manage_resources: Some(false),
                index_resources: Some(true),
            }),
            max_storage_in_gigabytes: 10,
            block_deployments_on_limit: true,
            email_notification: false,
            members: Vec::new(),
            groups: Vec::new(),
        }
    }

    #[test]
    fn test_unpack_maps_fields_and_units() {
        let project = unpack_project(&sample_data()).unwrap().unwrap();
        assert_eq!(project.key, "abc");
        assert_eq!(project.storage_quota, 10 * 1024 * 1024 * 1024);
        assert!(project.soft_limit);
        assert_eq!(
            project.admin_privileges,
            Some(AdminPrivileges {
                manage_members: true,
                manage_resources: false,
                index_resources: true,
            })
        );
    }

    #[test]
    fn test_wire_field_names() {
        let project = unpack_project(&sample_data()).unwrap().unwrap();
        let json = serde_json::to_value(&project).unwrap();
        assert_eq!(json["project_key"], "abc");
        assert_eq!(json["display_name"], "My Project");
        assert_eq!(json["storage_quota_bytes"], 10_737_418_240_i64);
        assert_eq!(json["soft_limit"], true);
        assert_eq!(json["storage_quota_email_notification"], false);
        assert_eq!(json["admin_privileges"]["manage_members"], true);
    }

    #[test]
    fn test_pack_unpack_round_trip() {
        let data = sample_data();
        let project = unpack_project(&data).unwrap().unwrap();
        assert_eq!(pack_project(project, Vec::new(), Vec::new()), data);
    }

    #[test]
    fn test_unlimited_quota_round_trip() {
        let data = ProjectData {
            max_storage_in_gigabytes: -1,
            ..sample_data()
        };
        let project = unpack_project(&data).unwrap().unwrap();
        assert_eq!(project.storage_quota, -1);
        assert_eq!(pack_project(project, Vec::new(), Vec::new()).max_storage_in_gigabytes, -1);
    }

    #[test]
    fn test_empty_admin_privileges_block_yields_nothing() {
        let data = ProjectData {
            admin_privileges: Some(AdminPrivilegesBlock::default()),
            ..sample_data()
        };
        assert_eq!(unpack_project(&data).unwrap(), None);
    }

    #[test]
    fn test_partial_admin_privileges_block_is_invalid() {
        let data = ProjectData {
            admin_privileges: Some(AdminPrivilegesBlock {
                manage_members: Some(true),
                ..AdminPrivilegesBlock::default()
            }),
            ..sample_data()
        };
        let err = unpack_project(&data).unwrap_err();
        assert_eq!(err.attribute, "admin_privileges.manage_resources");
    }

    #[test]
    fn test_absent_admin_privileges_is_sent_as_null() {
        let data = ProjectData {
            admin_privileges: None,
            ..sample_data()
        };
        let project = unpack_project(&data).unwrap().unwrap();
        assert!(serde_json::to_value(&project).unwrap()["admin_privileges"].is_null());
    }

    #[test]
    fn test_validation_runs_before_anything_else() {
        let data = ProjectData {
            key: "NOPE".to_string(),
            ..sample_data()
        };
        assert_eq!(unpack_project(&data).unwrap_err().attribute, "key");

        let data = ProjectData {
            max_storage_in_gigabytes: 0,
            ..sample_data()
        };
        assert_eq!(
            unpack_project(&data).unwrap_err().attribute,
            "max_storage_in_gigabytes"
        );
    }

    #[test]
    fn test_config_defaults() {
        let data: ProjectData = serde_json::from_value(serde_json::json!({
            "key": "abc",
            "display_name": "My Project"
        }))
        .unwrap();
        assert_eq!(data.max_storage_in_gigabytes, -1);
        assert!(!data.block_deployments_on_limit);
        assert!(!data.email_notification);
        assert!(data.admin_privileges.is_none());
        assert!(data.members.is_empty());
    }

    #[test]
    fn test_empty_description_is_absent_in_state() {
        let project = Project {
            key: "abc".to_string(),
            display_name: "x".to_string(),
            ..Project::default()
        };
        assert_eq!(pack_project(project, Vec::new(), Vec::new()).description, None);
    }

    #[test]
    fn test_import_is_pass_through() {
        let data = ProjectResource.import("abc").unwrap();
        assert_eq!(data.id(), Some("abc"));
        assert_eq!(data.attributes.key, "abc");
    }

    #[test]
    fn test_suppress_diff_only_for_storage() {
        assert!(ProjectResource.suppress_diff("max_storage_in_gigabytes", "5", "5"));
        assert!(!ProjectResource.suppress_diff("max_storage_in_gigabytes", "5", "x"));
        assert!(!ProjectResource.suppress_diff("display_name", "a", "a"));
    }
}
