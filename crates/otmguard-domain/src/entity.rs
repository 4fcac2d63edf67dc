use crate::model::{Component, Dataflow, Otm};
use otmguard_types::EntityKind;
use serde_json::Value as JsonValue;

/// A value produced by field access, shared by the predicate evaluator and
/// the message template expander.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    Str(String),
    List(Vec<Value>),
}

impl Value {
    /// Standard truthiness: null and empty collections are false, numbers
    /// are false at zero, strings are false when empty.
    pub fn truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::List(items) => !items.is_empty(),
        }
    }

    /// Render for template substitution. Null renders empty rather than a
    /// spelled-out placeholder.
    pub fn render(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    n.to_string()
                }
            }
            Value::Str(s) => s.clone(),
            Value::List(items) => items
                .iter()
                .map(Value::render)
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

/// The candidate an enabled rule is currently looking at: one component,
/// one dataflow, or the whole document for `select: otm`.
///
/// Fields are addressable by their wire names (`trustZone`, `otmVersion`)
/// so predicates and templates stay selector-agnostic.
#[derive(Clone, Copy, Debug)]
pub enum Entity<'a> {
    Component(&'a Component),
    Dataflow(&'a Dataflow),
    Document(&'a Otm),
}

impl<'a> Entity<'a> {
    pub fn kind(&self) -> EntityKind {
        match self {
            Entity::Component(_) => EntityKind::Component,
            Entity::Dataflow(_) => EntityKind::Dataflow,
            Entity::Document(_) => EntityKind::Otm,
        }
    }

    /// The id stamped on findings; the whole-document candidate has the
    /// literal id `otm`.
    pub fn id(&self) -> &str {
        match self {
            Entity::Component(c) => &c.id,
            Entity::Dataflow(d) => &d.id,
            Entity::Document(_) => "otm",
        }
    }

    /// Look up a field by wire name. `None` means the entity has no such
    /// field, which is distinct from a present-but-null field.
    pub fn field(&self, name: &str) -> Option<Value> {
        match self {
            Entity::Component(c) => match name {
                "id" => Some(Value::Str(c.id.clone())),
                "name" => Some(Value::Str(c.name.clone())),
                "type" => Some(Value::Str(c.kind.clone())),
                "trustZone" => Some(opt_str(c.trust_zone.as_deref())),
                "tags" => Some(Value::List(
                    c.tags.iter().cloned().map(Value::Str).collect(),
                )),
                _ => None,
            },
            Entity::Dataflow(d) => match name {
                "id" => Some(Value::Str(d.id.clone())),
                "source" => Some(Value::Str(d.source.clone())),
                "destination" => Some(Value::Str(d.destination.clone())),
                "protocol" => Some(opt_str(d.protocol.as_deref())),
                _ => None,
            },
            Entity::Document(o) => match name {
                "id" => Some(Value::Str("otm".to_string())),
                "otmVersion" => Some(Value::Str(o.otm_version.clone())),
                "name" => Some(Value::Str(o.name.clone())),
                _ => None,
            },
        }
    }

    pub fn tags(&self) -> &[String] {
        match self {
            Entity::Component(c) => &c.tags,
            Entity::Dataflow(_) | Entity::Document(_) => &[],
        }
    }

    pub fn trust_zone(&self) -> Option<&str> {
        match self {
            Entity::Component(c) => c.trust_zone.as_deref(),
            Entity::Dataflow(_) | Entity::Document(_) => None,
        }
    }

    /// Serialize the full entity for the finding's evidence payload.
    pub fn evidence(&self) -> JsonValue {
        let result = match self {
            Entity::Component(c) => serde_json::to_value(c),
            Entity::Dataflow(d) => serde_json::to_value(d),
            Entity::Document(o) => serde_json::to_value(o),
        };
        result.unwrap_or(JsonValue::Null)
    }
}

fn opt_str(v: Option<&str>) -> Value {
    match v {
        Some(s) => Value::Str(s.to_string()),
        None => Value::Null,
    }
}
