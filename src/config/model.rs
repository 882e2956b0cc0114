use std::collections::BTreeMap;

/// Typed view of an untyped YAML node (§9 "Dynamic typing → sum types"). Product property bags
/// and the `settings` block are both `map<string, any>` on the wire; this is what that decodes
/// into.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Mapping(BTreeMap<String, Value>),
    Sequence(Vec<Value>),
}

impl Value {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Mapping(m) => Some(m),
            _ => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_mapping().and_then(|m| m.get(key))
    }

    pub fn from_yaml(node: &serde_yaml::Value) -> Value {
        match node {
            serde_yaml::Value::Null => Value::Null,
            serde_yaml::Value::Bool(b) => Value::Bool(*b),
            serde_yaml::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else {
                    Value::Float(n.as_f64().unwrap_or(0.0))
                }
            }
            serde_yaml::Value::String(s) => Value::String(s.clone()),
            serde_yaml::Value::Sequence(seq) => Value::Sequence(seq.iter().map(Value::from_yaml).collect()),
            serde_yaml::Value::Mapping(map) => {
                let mut out = BTreeMap::new();
                for (k, v) in map {
                    if let Some(key) = k.as_str() {
                        out.insert(key.to_string(), Value::from_yaml(v));
                    }
                }
                Value::Mapping(out)
            }
            serde_yaml::Value::Tagged(tagged) => Value::from_yaml(&tagged.value),
        }
    }

    pub fn to_yaml(&self) -> serde_yaml::Value {
        match self {
            Value::Null => serde_yaml::Value::Null,
            Value::Bool(b) => serde_yaml::Value::Bool(*b),
            Value::Int(i) => serde_yaml::Value::Number((*i).into()),
            Value::Float(f) => serde_yaml::Value::Number((*f).into()),
            Value::String(s) => serde_yaml::Value::String(s.clone()),
            Value::Sequence(seq) => serde_yaml::Value::Sequence(seq.iter().map(Value::to_yaml).collect()),
            Value::Mapping(map) => {
                let mut out = serde_yaml::Mapping::new();
                for (k, v) in map {
                    out.insert(serde_yaml::Value::String(k.clone()), v.to_yaml());
                }
                serde_yaml::Value::Mapping(out)
            }
        }
    }

    /// Flattens this value into `(dotted.path, leaf)` pairs under `prefix`, recursing through
    /// mappings only — scalars and sequences are leaves (§4.2).
    pub fn flatten(&self, prefix: &str) -> Vec<(String, Value)> {
        match self {
            Value::Mapping(map) => map
                .iter()
                .flat_map(|(k, v)| v.flatten(&format!("{prefix}.{k}")))
                .collect(),
            other => vec![(prefix.to_string(), other.clone())],
        }
    }
}

/// A product entry under `tssc.products` (§3.1, §6.2).
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub name: String,
    pub enabled: bool,
    pub namespace: Option<String>,
    pub properties: Value,
}

impl Product {
    /// Invariant 6 (§3.3): a product is valid iff disabled, or enabled with a non-empty namespace.
    pub fn is_valid(&self) -> bool {
        if !self.enabled {
            return true;
        }
        self.namespace.as_deref().is_some_and(|ns| !ns.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flatten_recurses_through_mappings_only() {
        let mut inner = BTreeMap::new();
        inner.insert("debug".to_string(), Value::Bool(false));
        let mut outer = BTreeMap::new();
        outer.insert("ci".to_string(), Value::Mapping(inner));
        outer.insert("crc".to_string(), Value::Bool(true));
        let value = Value::Mapping(outer);

        let mut leaves = value.flatten("tssc.settings");
        leaves.sort_by(|a, b| a.0.cmp(&b.0));
        assert_eq!(
            leaves,
            vec![
                ("tssc.settings.ci.debug".to_string(), Value::Bool(false)),
                ("tssc.settings.crc".to_string(), Value::Bool(true)),
            ]
        );
    }

    #[test]
    fn product_invariant_six() {
        let disabled = Product {
            name: "a".to_string(),
            enabled: false,
            namespace: None,
            properties: Value::Mapping(BTreeMap::new()),
        };
        assert!(disabled.is_valid());

        let enabled_without_namespace = Product {
            enabled: true,
            ..disabled.clone()
        };
        assert!(!enabled_without_namespace.is_valid());

        let enabled_with_namespace = Product {
            enabled: true,
            namespace: Some("app-a".to_string()),
            ..disabled
        };
        assert!(enabled_with_namespace.is_valid());
    }
}
