//! Resource Registry - central registration of all resources.
//!
//! When adding a new resource:
//! 1. Create the resource file in `definitions/`
//! 2. Export it in `definitions/mod.rs`
//! 3. Register it here

use super::definitions::{
    GreetingResource, ResourceDefinition, ResourceTemplateDefinition, ServerInfoResource,
};
use super::service::{ResourceDescriptor, ResourceEntry, ResourceTemplateDescriptor, TemplateEntry};
use super::template::UriTemplate;
use crate::core::config::ServerConfig;

fn build_resource<R: ResourceDefinition>(server: &ServerConfig) -> ResourceEntry {
    ResourceEntry {
        resource: ResourceDescriptor {
            uri: R::URI.to_string(),
            name: R::NAME.to_string(),
            description: Some(R::DESCRIPTION.to_string()),
            mime_type: Some(R::MIME_TYPE.to_string()),
        },
        content: R::content(server),
    }
}

fn build_template<T: ResourceTemplateDefinition>() -> TemplateEntry {
    TemplateEntry {
        template: ResourceTemplateDescriptor {
            uri_template: T::URI_TEMPLATE.to_string(),
            name: T::NAME.to_string(),
            description: Some(T::DESCRIPTION.to_string()),
            mime_type: Some(T::MIME_TYPE.to_string()),
        },
        pattern: UriTemplate::parse(T::URI_TEMPLATE),
        render: T::render,
    }
}

/// All fixed resources, in listing order.
pub fn get_all_resources(server: &ServerConfig) -> Vec<ResourceEntry> {
    vec![build_resource::<ServerInfoResource>(server)]
}

/// All resource templates, in the order they are tried on read.
pub fn get_all_resource_templates() -> Vec<TemplateEntry> {
    vec![build_template::<GreetingResource>()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Config;

    #[test]
    fn test_get_all_resources() {
        let resources = get_all_resources(&Config::default().server);
        let uris: Vec<_> = resources.iter().map(|r| r.resource.uri.as_str()).collect();
        assert_eq!(uris, vec!["mcp://server/info"]);
    }

    #[test]
    fn test_get_all_resource_templates() {
        let templates = get_all_resource_templates();
        assert_eq!(templates.len(), 1);
        assert_eq!(templates[0].template.uri_template, "greeting://{name}");
        assert!(templates[0].pattern.match_uri("greeting://An").is_some());
    }
}
