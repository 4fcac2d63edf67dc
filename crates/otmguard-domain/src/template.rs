//! `{field}` message template expansion.
//!
//! Placeholders resolve against the matched entity's fields by wire name.
//! An unresolved placeholder is a hard error: the engine skips that
//! finding rather than emit a partially substituted message. `{{` and `}}`
//! escape to literal braces.

use crate::entity::Entity;
use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq)]
pub enum TemplateError {
    #[error("message template references unknown field '{0}'")]
    UnknownField(String),
    #[error("unbalanced '{{' in message template")]
    UnbalancedBrace,
    #[error("empty placeholder in message template")]
    EmptyPlaceholder,
}

/// Expand `template` using `entity`'s fields as substitution variables.
pub fn expand(template: &str, entity: &Entity<'_>) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '{' => {
                if chars.peek() == Some(&'{') {
                    chars.next();
                    out.push('{');
                    continue;
                }
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some(c) => name.push(c),
                        None => return Err(TemplateError::UnbalancedBrace),
                    }
                }
                if name.is_empty() {
                    return Err(TemplateError::EmptyPlaceholder);
                }
                let value = entity
                    .field(&name)
                    .ok_or_else(|| TemplateError::UnknownField(name.clone()))?;
                out.push_str(&value.render());
            }
            '}' => {
                if chars.peek() == Some(&'}') {
                    chars.next();
                }
                out.push('}');
            }
            other => out.push(other),
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{component, dataflow};

    #[test]
    fn expands_fields_by_wire_name() {
        let flow = dataflow("f1", "web", "db", Some("http"));
        let e = Entity::Dataflow(&flow);
        assert_eq!(
            expand("flow {id} ({source} -> {destination}) uses {protocol}", &e),
            Ok("flow f1 (web -> db) uses http".to_string())
        );
    }

    #[test]
    fn null_field_renders_empty() {
        let flow = dataflow("f1", "web", "db", None);
        let e = Entity::Dataflow(&flow);
        assert_eq!(
            expand("protocol is '{protocol}'", &e),
            Ok("protocol is ''".to_string())
        );
    }

    #[test]
    fn unknown_placeholder_is_an_error() {
        let flow = dataflow("f1", "web", "db", None);
        let e = Entity::Dataflow(&flow);
        assert_eq!(
            expand("flow {id} at {port}", &e),
            Err(TemplateError::UnknownField("port".to_string()))
        );
    }

    #[test]
    fn doubled_braces_escape() {
        let c = component("a", "public", &[]);
        let e = Entity::Component(&c);
        assert_eq!(
            expand("literal {{braces}} around {id}", &e),
            Ok("literal {braces} around a".to_string())
        );
    }

    #[test]
    fn unterminated_placeholder_is_an_error() {
        let c = component("a", "public", &[]);
        let e = Entity::Component(&c);
        assert_eq!(expand("oops {id", &e), Err(TemplateError::UnbalancedBrace));
        assert_eq!(expand("oops {}", &e), Err(TemplateError::EmptyPlaceholder));
    }

    #[test]
    fn tags_render_comma_joined() {
        let c = component("a", "public", &["pii", "internet"]);
        let e = Entity::Component(&c);
        assert_eq!(
            expand("tags: {tags}", &e),
            Ok("tags: pii, internet".to_string())
        );
    }
}
