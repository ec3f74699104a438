//! `greeting://{name}` - company contact card.

use tracing::debug;

use super::ResourceTemplateDefinition;
use crate::domains::resources::error::ResourceError;
use crate::domains::resources::template::TemplateParams;

/// Greeting resource. Every name resolves to the same company card.
pub struct GreetingResource;

impl GreetingResource {
    /// Text served for every name.
    pub const CARD: &'static str = "Tên công ty: Fpt Online\nĐịa chỉ: số 10 Phạm Văn Bạch";
}

impl ResourceTemplateDefinition for GreetingResource {
    const URI_TEMPLATE: &'static str = "greeting://{name}";
    const NAME: &'static str = "Greeting";
    const DESCRIPTION: &'static str = "Company information shown when greeting a visitor";
    const MIME_TYPE: &'static str = "text/plain";

    fn render(params: &TemplateParams) -> Result<String, ResourceError> {
        let name = params
            .get("name")
            .ok_or_else(|| ResourceError::missing_parameter("name"))?;
        debug!(name = %name, "Rendering greeting");
        Ok(Self::CARD.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_ignores_name() {
        let mut params = TemplateParams::new();
        params.insert("name".to_string(), "Lan".to_string());
        assert_eq!(GreetingResource::render(&params).unwrap(), GreetingResource::CARD);
    }

    #[test]
    fn test_render_requires_name() {
        assert_eq!(
            GreetingResource::render(&TemplateParams::new()),
            Err(ResourceError::missing_parameter("name"))
        );
    }
}
