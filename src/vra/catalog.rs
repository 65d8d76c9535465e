//! Catalog item resolution and request templates.

use std::collections::HashMap;

use serde_json::Value;
use tracing::{debug, info};

use super::types::{EntitledCatalogItem, Page};
use super::{VraClient, VraError, consumer_path};
use crate::types::CatalogId;

impl VraClient {
    pub(super) async fn catalog_id(&self, blueprint_name: &str) -> Result<CatalogId, VraError> {
        let lookup_error = |message: String| VraError::CatalogLookup {
            blueprint_name: blueprint_name.to_owned(),
            message,
        };
        let page: Page<EntitledCatalogItem> = self
            .get_json(&consumer_path("/entitledCatalogItems"), &[])
            .await
            .map_err(|err| lookup_error(err.to_string()))?;

        let id = select_catalog_id(page.content, blueprint_name).map_err(lookup_error)?;
        info!(blueprint = blueprint_name, catalog_id = %id, "resolved catalog item");
        Ok(id)
    }

    pub(super) async fn fetch_template(&self, catalog_id: &CatalogId) -> Result<Value, VraError> {
        let path = consumer_path(&format!("/entitledCatalogItems/{catalog_id}/requests/template"));
        let template: Value = self
            .get_json(&path, &[])
            .await
            .map_err(|err| VraError::TemplateFetch {
                catalog_id: catalog_id.to_string(),
                message: err.to_string(),
            })?;
        debug!(catalog_id = %catalog_id, "fetched request template");
        Ok(template)
    }
}

/// Builds the name → id mapping and picks `blueprint_name`.
///
/// The same name listed twice with different ids is ambiguous and rejected
/// rather than resolved by listing order.
fn select_catalog_id(
    items: Vec<EntitledCatalogItem>,
    blueprint_name: &str,
) -> Result<CatalogId, String> {
    let mut by_name: HashMap<String, CatalogId> = HashMap::new();
    let mut conflicts: Vec<CatalogId> = Vec::new();
    for item in items {
        let name = item.catalog_item.name;
        let id = item.catalog_item.id;
        match by_name.get(&name) {
            Some(existing) if *existing != id && name == blueprint_name => {
                if conflicts.is_empty() {
                    conflicts.push(existing.clone());
                }
                conflicts.push(id);
            }
            Some(_) => {}
            None => {
                by_name.insert(name, id);
            }
        }
    }

    if !conflicts.is_empty() {
        let ids: Vec<&str> = conflicts.iter().map(CatalogId::as_str).collect();
        return Err(format!(
            "catalog item name is ambiguous; matching ids: {}",
            ids.join(", ")
        ));
    }

    by_name
        .remove(blueprint_name)
        .ok_or_else(|| String::from("no entitled catalog item has this name"))
}
