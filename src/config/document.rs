use crate::errors::ConfigError;

use super::model::{Product, Value};

fn kind_name(node: &serde_yaml::Value) -> String {
    match node {
        serde_yaml::Value::Null => "null",
        serde_yaml::Value::Bool(_) => "bool",
        serde_yaml::Value::Number(_) => "number",
        serde_yaml::Value::String(_) => "string",
        serde_yaml::Value::Sequence(_) => "sequence",
        serde_yaml::Value::Mapping(_) => "mapping",
        serde_yaml::Value::Tagged(_) => "tagged",
    }
    .to_string()
}

fn find_case_insensitive(map: &serde_yaml::Mapping, key: &str) -> Option<serde_yaml::Value> {
    map.keys().find(|k| k.as_str().is_some_and(|s| s.eq_ignore_ascii_case(key))).cloned()
}

/// Structure-preserving in-memory representation of the installer configuration (§4.2, §9). Holds
/// both the raw YAML node tree — mutated directly so key order and un-decoded fields survive
/// round-trips — and a decoded typed view regenerated after every mutation.
#[derive(Debug, Clone)]
pub struct ConfigDocument {
    root: serde_yaml::Value,
    installer_namespace: String,
    settings: Value,
    settings_present: bool,
    products: Vec<Product>,
}

impl ConfigDocument {
    pub fn from_bytes(payload: &[u8], installer_namespace: impl Into<String>) -> Result<Self, ConfigError> {
        if payload.is_empty() {
            return Err(ConfigError::EmptyConfig);
        }
        let root: serde_yaml::Value =
            serde_yaml::from_slice(payload).map_err(|err| ConfigError::UnmarshalConfig { reason: err.to_string() })?;
        let (settings, settings_present, products) = decode(&root)?;
        Ok(ConfigDocument {
            root,
            installer_namespace: installer_namespace.into(),
            settings,
            settings_present,
            products,
        })
    }

    pub fn namespace(&self) -> &str {
        &self.installer_namespace
    }

    pub fn settings(&self) -> &Value {
        &self.settings
    }

    pub fn get_product(&self, name: &str) -> Option<&Product> {
        self.products.iter().find(|product| product.name == name)
    }

    pub fn enabled_products(&self) -> Vec<&Product> {
        self.products.iter().filter(|product| product.enabled).collect()
    }

    /// Flattens `value` under `path` and applies each leaf assignment to the preserved node tree,
    /// then re-decodes the typed view (§4.2).
    pub fn set(&mut self, path: &str, value: Value) -> Result<(), ConfigError> {
        for (leaf_path, leaf_value) in value.flatten(path) {
            self.apply_leaf(&leaf_path, leaf_value)?;
        }
        self.redecode()
    }

    /// Marshals `product` to a mapping and applies every leaf except `name` under
    /// `tssc.products.<index>`, where `<index>` is looked up by matching `name` (§4.2).
    pub fn set_product(&mut self, name: &str, product: &Product) -> Result<(), ConfigError> {
        let index = self
            .products
            .iter()
            .position(|existing| existing.name == name)
            .ok_or_else(|| ConfigError::ProductNotFound { name: name.to_string() })?;

        let prefix = format!("tssc.products.{index}");
        let marshaled = product_to_value(product);
        let fields = marshaled.as_mapping().expect("product_to_value always returns a mapping");
        for (field, leaf_value) in fields {
            if field == "name" {
                continue;
            }
            self.apply_leaf_with(&format!("{prefix}.{field}"), leaf_value.clone(), true)?;
        }
        self.redecode()
    }

    /// For every product with no namespace, assigns the installer namespace (§4.2).
    pub fn apply_defaults(&mut self) -> Result<(), ConfigError> {
        let installer_namespace = self.installer_namespace.clone();
        let indices: Vec<usize> = self
            .products
            .iter()
            .enumerate()
            .filter(|(_, product)| product.namespace.is_none())
            .map(|(index, _)| index)
            .collect();
        for index in indices {
            self.apply_leaf(&format!("tssc.products.{index}.namespace"), Value::String(installer_namespace.clone()))?;
        }
        self.redecode()
    }

    /// Fails if `settings` is missing; then validates every product against invariant 6 (§3.3).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.settings_present {
            return Err(ConfigError::InvalidConfig {
                reason: "missing `tssc.settings`".to_string(),
            });
        }
        for product in &self.products {
            if !product.is_valid() {
                return Err(ConfigError::InvalidConfig {
                    reason: format!("product `{}` is enabled but has no namespace", product.name),
                });
            }
        }
        Ok(())
    }

    pub fn marshal(&self) -> Result<Vec<u8>, ConfigError> {
        serde_yaml::to_string(&self.root)
            .map(String::into_bytes)
            .map_err(|err| ConfigError::InvalidConfig { reason: err.to_string() })
    }

    pub fn string(&self) -> Result<String, ConfigError> {
        let bytes = self.marshal()?;
        let body = String::from_utf8(bytes).expect("serde_yaml always emits valid utf-8");
        Ok(format!("---\n{body}"))
    }

    fn apply_leaf(&mut self, leaf_path: &str, value: Value) -> Result<(), ConfigError> {
        self.apply_leaf_with(leaf_path, value, false)
    }

    /// Applies a single leaf assignment. When `create_missing` is set, a mapping leaf that doesn't
    /// already exist is inserted rather than rejected with `KeyNotFound` — used by `set_product`,
    /// which implicitly creates new leaves under an existing product entry, unlike `set` (§4.2,
    /// §9 Open Questions: this asymmetry is intentional — products are pre-declared, their
    /// sub-fields are not).
    fn apply_leaf_with(&mut self, leaf_path: &str, value: Value, create_missing: bool) -> Result<(), ConfigError> {
        let segments: Vec<&str> = leaf_path.split('.').collect();
        let (last, ancestors) = segments.split_last().expect("leaf_path is never empty");

        let mut node = &mut self.root;
        for segment in ancestors {
            node = navigate_mut(node, segment, leaf_path)?;
        }

        match node {
            serde_yaml::Value::Mapping(map) => {
                let key = match find_case_insensitive(map, last) {
                    Some(key) => key,
                    None if create_missing => serde_yaml::Value::String(last.to_string()),
                    None => {
                        return Err(ConfigError::KeyNotFound {
                            path: leaf_path.to_string(),
                        })
                    }
                };
                map.insert(key, value.to_yaml());
                Ok(())
            }
            serde_yaml::Value::Sequence(seq) => {
                let index: usize = last.parse().map_err(|_| ConfigError::KeyNotFound {
                    path: leaf_path.to_string(),
                })?;
                let length = seq.len();
                let slot = seq.get_mut(index).ok_or(ConfigError::IndexOutOfBounds {
                    path: leaf_path.to_string(),
                    index,
                    length,
                })?;
                *slot = value.to_yaml();
                Ok(())
            }
            other => Err(ConfigError::CannotNavigate {
                path: leaf_path.to_string(),
                kind: kind_name(other),
            }),
        }
    }

    fn redecode(&mut self) -> Result<(), ConfigError> {
        let (settings, settings_present, products) = decode(&self.root)?;
        self.settings = settings;
        self.settings_present = settings_present;
        self.products = products;
        Ok(())
    }
}

fn navigate_mut<'a>(
    node: &'a mut serde_yaml::Value,
    segment: &str,
    full_path: &str,
) -> Result<&'a mut serde_yaml::Value, ConfigError> {
    match node {
        serde_yaml::Value::Mapping(map) => {
            let key = find_case_insensitive(map, segment).ok_or_else(|| ConfigError::KeyNotFound {
                path: full_path.to_string(),
            })?;
            Ok(map.get_mut(&key).expect("key was just located"))
        }
        serde_yaml::Value::Sequence(seq) => {
            let index: usize = segment.parse().map_err(|_| ConfigError::KeyNotFound {
                path: full_path.to_string(),
            })?;
            let length = seq.len();
            seq.get_mut(index).ok_or(ConfigError::IndexOutOfBounds {
                path: full_path.to_string(),
                index,
                length,
            })
        }
        other => Err(ConfigError::CannotNavigate {
            path: full_path.to_string(),
            kind: kind_name(other),
        }),
    }
}

fn decode(root: &serde_yaml::Value) -> Result<(Value, bool, Vec<Product>), ConfigError> {
    let tssc = root
        .as_mapping()
        .and_then(|map| map.get("tssc"))
        .ok_or_else(|| ConfigError::InvalidConfig {
            reason: "missing top-level key `tssc`".to_string(),
        })?;
    let tssc_map = tssc.as_mapping().ok_or_else(|| ConfigError::InvalidConfig {
        reason: "`tssc` is not a mapping".to_string(),
    })?;

    let settings_node = tssc_map.get("settings");
    let settings_present = settings_node.is_some();
    let settings = settings_node.map(Value::from_yaml).unwrap_or(Value::Mapping(Default::default()));

    let products = match tssc_map.get("products") {
        None => Vec::new(),
        Some(serde_yaml::Value::Sequence(seq)) => seq.iter().map(decode_product).collect::<Result<_, _>>()?,
        Some(_) => {
            return Err(ConfigError::InvalidConfig {
                reason: "`tssc.products` is not a sequence".to_string(),
            })
        }
    };

    Ok((settings, settings_present, products))
}

fn decode_product(node: &serde_yaml::Value) -> Result<Product, ConfigError> {
    let map = node.as_mapping().ok_or_else(|| ConfigError::InvalidConfig {
        reason: "product entry is not a mapping".to_string(),
    })?;
    let name = map
        .get("name")
        .and_then(serde_yaml::Value::as_str)
        .ok_or_else(|| ConfigError::InvalidConfig {
            reason: "product entry is missing `name`".to_string(),
        })?
        .to_string();
    let enabled = map.get("enabled").and_then(serde_yaml::Value::as_bool).unwrap_or(false);
    let namespace = map
        .get("namespace")
        .and_then(serde_yaml::Value::as_str)
        .map(str::to_string);
    let properties = map.get("properties").map(Value::from_yaml).unwrap_or(Value::Mapping(Default::default()));

    Ok(Product {
        name,
        enabled,
        namespace,
        properties,
    })
}

fn product_to_value(product: &Product) -> Value {
    let mut map = std::collections::BTreeMap::new();
    map.insert("name".to_string(), Value::String(product.name.clone()));
    map.insert("enabled".to_string(), Value::Bool(product.enabled));
    map.insert(
        "namespace".to_string(),
        product.namespace.clone().map(Value::String).unwrap_or(Value::Null),
    );
    map.insert("properties".to_string(), product.properties.clone());
    Value::Mapping(map)
}
