//! URI templates with simple `{name}` variables.

use std::collections::HashMap;

/// Variable values captured from a URI.
pub type TemplateParams = HashMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Variable(String),
}

/// A parsed URI template such as `greeting://{name}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UriTemplate {
    segments: Vec<Segment>,
}

impl UriTemplate {
    /// Parse a template. A `{` without a closing `}` is literal text.
    pub fn parse(template: &str) -> Self {
        let mut segments = Vec::new();
        let mut rest = template;

        while let Some(open) = rest.find('{') {
            let Some(len) = rest[open..].find('}') else {
                break;
            };
            let close = open + len;
            if open > 0 {
                segments.push(Segment::Literal(rest[..open].to_string()));
            }
            segments.push(Segment::Variable(rest[open + 1..close].to_string()));
            rest = &rest[close + 1..];
        }
        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }

        Self { segments }
    }

    /// Match a concrete URI against the template.
    ///
    /// A variable captures a non-empty run up to the next literal and never
    /// spans a `/`. Values are taken verbatim, without percent-decoding.
    pub fn match_uri(&self, uri: &str) -> Option<TemplateParams> {
        let mut params = TemplateParams::new();
        let mut rest = uri;
        let mut segments = self.segments.iter().peekable();

        while let Some(segment) = segments.next() {
            match segment {
                Segment::Literal(text) => rest = rest.strip_prefix(text.as_str())?,
                Segment::Variable(name) => {
                    let end = match segments.peek() {
                        Some(Segment::Literal(next)) => rest.find(next.as_str())?,
                        _ => rest.len(),
                    };
                    let value = &rest[..end];
                    if value.is_empty() || value.contains('/') {
                        return None;
                    }
                    params.insert(name.clone(), value.to_string());
                    rest = &rest[end..];
                }
            }
        }

        rest.is_empty().then_some(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_variable() {
        let template = UriTemplate::parse("greeting://{name}");
        let params = template.match_uri("greeting://An").unwrap();
        assert_eq!(params.get("name").map(String::as_str), Some("An"));
    }

    #[test]
    fn test_rejects_other_schemes_and_empty_values() {
        let template = UriTemplate::parse("greeting://{name}");
        assert!(template.match_uri("hello://An").is_none());
        assert!(template.match_uri("greeting://").is_none());
        assert!(template.match_uri("greeting://a/b").is_none());
    }

    #[test]
    fn test_variable_between_literals() {
        let template = UriTemplate::parse("users://{id}/profile");
        let params = template.match_uri("users://42/profile").unwrap();
        assert_eq!(params["id"], "42");
        assert!(template.match_uri("users://42/settings").is_none());
    }

    #[test]
    fn test_unclosed_brace_is_literal() {
        let template = UriTemplate::parse("odd://{name");
        assert!(template.match_uri("odd://{name").unwrap().is_empty());
        assert!(template.match_uri("odd://x").is_none());
    }
}
