//! Resource definitions module.
//!
//! Each resource is defined in its own file with its URI (or URI template),
//! metadata and content.

pub mod greeting;
pub mod server_info;

pub use greeting::GreetingResource;
pub use server_info::ServerInfoResource;

use super::error::ResourceError;
use super::template::TemplateParams;
use crate::core::config::ServerConfig;

/// A resource with a fixed URI.
pub trait ResourceDefinition {
    /// The unique URI of the resource.
    const URI: &'static str;

    /// The display name of the resource.
    const NAME: &'static str;

    /// A description of the resource.
    const DESCRIPTION: &'static str;

    /// The MIME type of the resource content.
    const MIME_TYPE: &'static str;

    /// Content, computed once at registration.
    fn content(server: &ServerConfig) -> String;
}

/// A family of resources addressed through a URI template.
pub trait ResourceTemplateDefinition {
    /// RFC 6570 level-1 template, e.g. `greeting://{name}`.
    const URI_TEMPLATE: &'static str;

    /// The display name of the template.
    const NAME: &'static str;

    /// A description of the template.
    const DESCRIPTION: &'static str;

    /// The MIME type of rendered content.
    const MIME_TYPE: &'static str;

    /// Render the resource for one set of template values.
    fn render(params: &TemplateParams) -> Result<String, ResourceError>;
}
