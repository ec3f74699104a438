//! Resources domain module.
//!
//! Resources are read-only documents addressed by URI. Fixed resources are
//! listed by `resources/list`; parameterized ones are advertised as URI
//! templates by `resources/templates/list`. `resources/read` serves both.
//!
//! ## Architecture
//!
//! - `definitions/` - Individual resource definitions (one file per resource)
//! - `template.rs` - URI template matching
//! - `registry.rs` - Central resource registration
//! - `service.rs` - Resource service for listing and reading
//!
//! ## Adding a New Resource
//!
//! 1. Create a new file in `definitions/`
//! 2. Implement `ResourceDefinition` or `ResourceTemplateDefinition`
//! 3. Export it in `definitions/mod.rs`
//! 4. Register it in `registry.rs`

pub mod definitions;
mod error;
mod registry;
mod service;
mod template;

pub use definitions::{ResourceDefinition, ResourceTemplateDefinition};
pub use error::ResourceError;
pub use registry::{get_all_resource_templates, get_all_resources};
pub use service::{
    ResourceContents, ResourceDescriptor, ResourceEntry, ResourceService,
    ResourceTemplateDescriptor, TemplateEntry,
};
pub use template::{TemplateParams, UriTemplate};
