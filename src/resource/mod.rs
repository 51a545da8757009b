//! Resource abstraction layer
//!
//! Every managed resource implements [`Resource`]: a create/read/update/delete
//! cycle against the Access API plus import. The declarative state of one
//! resource instance lives in a [`ResourceData`], which the caller owns for
//! the duration of an operation.
//!
//! # Resources
//!
//! - [`project`] - `project`, with nested `member` and `group` blocks
//! - [`membership`] - `project_user` and `project_group`
//!
//! # Example
//!
//! ```ignore
//! use access_projects::resource::{project::ProjectResource, Resource};
//!
//! async fn refresh(client: &AccessClient) -> anyhow::Result<()> {
//!     let mut data = ProjectResource.import("myproj")?;
//!     ProjectResource.read(client, &mut data).await?;
//!     Ok(())
//! }
//! ```

pub mod membership;
pub mod project;
pub mod units;
pub mod validation;

use crate::api::AccessClient;
use crate::state;
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub use membership::{Membership, MembershipData, MembershipResource, PrincipalKind};
pub use project::{AdminPrivileges, AdminPrivilegesBlock, Project, ProjectData, ProjectResource};

/// Declarative state of one resource instance: its identity plus typed attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceData<T> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    pub attributes: T,
}

impl<T> ResourceData<T> {
    /// State for a resource that does not exist remotely yet
    pub fn new(attributes: T) -> Self {
        Self {
            id: None,
            attributes,
        }
    }

    pub fn with_id(id: impl Into<String>, attributes: T) -> Self {
        Self {
            id: Some(id.into()),
            attributes,
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = Some(id.into());
    }

    pub fn clear_id(&mut self) {
        self.id = None;
    }

    /// The identity, or an error naming the resource type when it is unset
    pub fn require_id(&self, type_name: &str) -> Result<&str> {
        self.id()
            .with_context(|| format!("{} has no id; it has not been created or imported", type_name))
    }
}

impl<T: Serialize> ResourceData<T> {
    /// Flat attribute view (`member.0.roles.1`, `member.#`) of this state
    pub fn flat_attributes(&self) -> Result<BTreeMap<String, String>> {
        let value = serde_json::to_value(&self.attributes).context("Failed to encode state")?;
        let mut flat = state::flatten(&value);
        if let Some(id) = self.id() {
            flat.insert("id".to_string(), id.to_string());
        }
        Ok(flat)
    }
}

/// A managed resource type and its CRUD cycle
#[allow(async_fn_in_trait)]
pub trait Resource {
    /// Declarative attributes of one instance
    type Attributes: Serialize + DeserializeOwned + Clone;

    /// Resource type name as written in configuration
    const TYPE_NAME: &'static str;

    /// Create the remote object from `data` and refresh `data` from the API
    async fn create(&self, client: &AccessClient, data: &mut ResourceData<Self::Attributes>) -> Result<()>;

    /// Replace `data.attributes` with the remote view of the object
    async fn read(&self, client: &AccessClient, data: &mut ResourceData<Self::Attributes>) -> Result<()>;

    /// Push `data` to the existing remote object and refresh it
    async fn update(&self, client: &AccessClient, data: &mut ResourceData<Self::Attributes>) -> Result<()>;

    /// Remove the remote object
    async fn delete(&self, client: &AccessClient, data: &mut ResourceData<Self::Attributes>) -> Result<()>;

    /// Seed state from an import identifier; a following `read` fills the rest
    fn import(&self, id: &str) -> Result<ResourceData<Self::Attributes>>;

    /// Reject `config` before any request is sent
    fn validate(&self, _config: &Self::Attributes) -> Result<()> {
        Ok(())
    }

    /// Whether applying `config` writes nothing remotely
    fn is_noop(&self, _config: &Self::Attributes) -> bool {
        false
    }

    /// `config` in the canonical form `read` produces
    fn normalize(&self, config: Self::Attributes) -> Self::Attributes {
        config
    }

    /// Whether moving from `prior` to `planned` changes identity, forcing delete then create
    fn requires_replace(&self, _prior: &Self::Attributes, _planned: &Self::Attributes) -> bool {
        false
    }

    /// Whether a change of `attribute` from `old` to `new` should be ignored when planning
    fn suppress_diff(&self, _attribute: &str, _old: &str, _new: &str) -> bool {
        false
    }
}
