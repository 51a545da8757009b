//! Declarative management of JFrog Access projects.
//!
//! The crate maps declarative resource attributes onto the Access REST API
//! and back:
//!
//! - [`resource::ProjectResource`] - projects, with nested `member` / `group` blocks
//! - [`resource::MembershipResource`] - standalone `project_user` / `project_group`
//!
//! # Module Structure
//!
//! - [`api`] - HTTP client and path templating
//! - [`resource`] - resource definitions, pack/unpack, validation, CRUD
//! - [`state`] - flat attribute view and diffing of declarative state
//! - [`driver`] - plan/apply/import/destroy cycles with persisted state
//! - [`config`] - provider configuration
//! - [`error`] - typed errors

pub mod api;
pub mod config;
pub mod driver;
pub mod error;
pub mod resource;
pub mod state;

/// Version injected at compile time via ACCESS_PROJECTS_VERSION env var (set by CI/CD),
/// or "dev" for local builds.
pub const VERSION: &str = match option_env!("ACCESS_PROJECTS_VERSION") {
    Some(v) => v,
    None => "dev",
};
