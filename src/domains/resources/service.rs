//! Resource service implementation.
//!
//! Resources are defined in `definitions/` and registered via `registry.rs`.
//! Adding a new resource does NOT require modifying this file.

use serde::Serialize;
use tracing::{debug, info, instrument};

use super::error::ResourceError;
use super::registry::{get_all_resource_templates, get_all_resources};
use super::template::{TemplateParams, UriTemplate};
use crate::core::config::ServerConfig;

/// Resource metadata as listed to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDescriptor {
    pub uri: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

/// Resource template metadata as listed to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceTemplateDescriptor {
    pub uri_template: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

/// Text contents of one resource, as returned by `resources/read`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceContents {
    pub uri: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    pub text: String,
}

/// A fixed resource and its content.
#[derive(Debug, Clone)]
pub struct ResourceEntry {
    pub resource: ResourceDescriptor,
    pub content: String,
}

/// Renders a templated resource from the values captured out of its URI.
pub type RenderFn = fn(&TemplateParams) -> Result<String, ResourceError>;

/// A resource template and how to render it.
#[derive(Clone)]
pub struct TemplateEntry {
    pub template: ResourceTemplateDescriptor,
    pub pattern: UriTemplate,
    pub render: RenderFn,
}

/// Service for listing and reading resources.
///
/// Built once at startup and only read afterwards.
pub struct ResourceService {
    resources: Vec<ResourceEntry>,
    templates: Vec<TemplateEntry>,
}

impl ResourceService {
    /// Create the service with every registered resource and template.
    pub fn new(server: &ServerConfig) -> Self {
        let service = Self {
            resources: get_all_resources(server),
            templates: get_all_resource_templates(),
        };
        info!(
            "Registered {} resources and {} resource templates",
            service.resources.len(),
            service.templates.len()
        );
        service
    }

    /// Fixed resources, in registration order.
    pub fn list_resources(&self) -> Vec<ResourceDescriptor> {
        self.resources.iter().map(|e| e.resource.clone()).collect()
    }

    /// Resource templates, in registration order.
    pub fn list_resource_templates(&self) -> Vec<ResourceTemplateDescriptor> {
        self.templates.iter().map(|e| e.template.clone()).collect()
    }

    /// Read a resource by URI.
    ///
    /// Fixed resources are matched exactly first; templates are then tried in
    /// registration order.
    #[instrument(skip(self))]
    pub fn read_resource(&self, uri: &str) -> Result<ResourceContents, ResourceError> {
        if let Some(entry) = self.resources.iter().find(|e| e.resource.uri == uri) {
            debug!("Serving fixed resource");
            return Ok(ResourceContents {
                uri: uri.to_string(),
                mime_type: entry.resource.mime_type.clone(),
                text: entry.content.clone(),
            });
        }

        for entry in &self.templates {
            if let Some(params) = entry.pattern.match_uri(uri) {
                debug!(template = %entry.template.uri_template, "Rendering templated resource");
                return Ok(ResourceContents {
                    uri: uri.to_string(),
                    mime_type: entry.template.mime_type.clone(),
                    text: (entry.render)(&params)?,
                });
            }
        }

        Err(ResourceError::not_found(uri))
    }
}
