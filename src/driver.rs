//! Operation driver
//!
//! Runs plan/apply/destroy/import cycles for any [`Resource`], persisting
//! state between runs as a JSON file.

use crate::api::AccessClient;
use crate::resource::{Resource, ResourceData};
use crate::state::{self, AttributeChange};
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

/// Load a state file; `None` when it does not exist
pub fn load_state<T: DeserializeOwned>(path: &Path) -> Result<Option<ResourceData<T>>> {
    if !path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read state {:?}", path))?;
    let data = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse state {:?}", path))?;
    Ok(Some(data))
}

/// Write a state file, creating parent directories
pub fn save_state<T: Serialize>(path: &Path, data: &ResourceData<T>) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let content = serde_json::to_string_pretty(data)?;
    std::fs::write(path, content).with_context(|| format!("Failed to write state {:?}", path))
}

/// Attribute changes needed to move `prior` state to `config`
pub fn plan<R: Resource>(
    resource: &R,
    prior: Option<&ResourceData<R::Attributes>>,
    config: &R::Attributes,
) -> Result<Vec<AttributeChange>> {
    let old = match prior {
        Some(data) => data.flat_attributes()?,
        None => Default::default(),
    };
    let mut new = ResourceData::new(resource.normalize(config.clone())).flat_attributes()?;

    // Identity is computed; carry it over so it never shows as removed
    if let Some(id) = old.get("id") {
        new.insert("id".to_string(), id.clone());
    }

    Ok(state::diff(&old, &new, |path, old, new| {
        resource.suppress_diff(path, old, new)
    }))
}

/// Create or update so the remote object matches `config`.
///
/// `config` is validated before any request. Returns the refreshed state.
/// When the configuration writes nothing, the prior state comes back
/// untouched, or a state without id when there was none.
pub async fn apply<R: Resource>(
    resource: &R,
    client: &AccessClient,
    prior: Option<ResourceData<R::Attributes>>,
    config: R::Attributes,
) -> Result<ResourceData<R::Attributes>> {
    resource.validate(&config)?;
    let config = resource.normalize(config);
    let prior = prior.filter(|data| data.id().is_some());

    if resource.is_noop(&config) {
        tracing::warn!("{} configuration writes nothing; keeping prior state", R::TYPE_NAME);
        return Ok(prior.unwrap_or_else(|| ResourceData::new(config)));
    }

    match prior {
        Some(prior) if resource.requires_replace(&prior.attributes, &config) => {
            tracing::info!("{} {:?} must be replaced", R::TYPE_NAME, prior.id());
            let mut old = prior;
            resource.delete(client, &mut old).await?;

            let mut data = ResourceData::new(config);
            resource.create(client, &mut data).await?;
            Ok(data)
        }
        Some(prior) => {
            let id = prior.require_id(R::TYPE_NAME)?.to_string();
            let mut data = ResourceData::with_id(id, config);
            resource.update(client, &mut data).await?;
            Ok(data)
        }
        None => {
            let mut data = ResourceData::new(config);
            resource.create(client, &mut data).await?;
            Ok(data)
        }
    }
}

/// Import an existing object by id and read it
pub async fn import<R: Resource>(
    resource: &R,
    client: &AccessClient,
    id: &str,
) -> Result<ResourceData<R::Attributes>> {
    let mut data = resource.import(id)?;
    resource.read(client, &mut data).await?;
    Ok(data)
}

/// Refresh state from the API
pub async fn refresh<R: Resource>(
    resource: &R,
    client: &AccessClient,
    mut data: ResourceData<R::Attributes>,
) -> Result<ResourceData<R::Attributes>> {
    resource.read(client, &mut data).await?;
    Ok(data)
}

/// Delete the remote object
pub async fn destroy<R: Resource>(
    resource: &R,
    client: &AccessClient,
    mut data: ResourceData<R::Attributes>,
) -> Result<()> {
    resource.delete(client, &mut data).await
}
