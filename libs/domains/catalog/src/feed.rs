//! Shop feed parsing.
//!
//! A feed is a YAML document of the shape
//!
//! ```yaml
//! shop: Связной
//! categories:
//!   - id: 224
//!     name: Смартфоны
//! goods:
//!   - id: 4216292
//!     category: 224
//!     model: apple/iphone/xs-max
//!     name: Смартфон Apple iPhone XS Max 512GB (золотистый)
//!     price: 110000
//!     price_rrc: 116990
//!     quantity: 14
//!     parameters:
//!       "Диагональ (дюйм)": 6.5
//!       "Цвет": золотистый
//! ```
//!
//! The whole document is checked here, before anything is written.

use serde_yaml::{Mapping, Value};
use std::collections::HashSet;

use crate::error::FeedError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedCategory {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedGood {
    pub id: i64,
    pub category: i64,
    pub model: String,
    pub name: String,
    pub quantity: i64,
    pub price: i64,
    pub price_rrc: i64,
    /// Parameter name and its textual value, in feed order
    pub parameters: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feed {
    pub shop: String,
    pub categories: Vec<FeedCategory>,
    pub goods: Vec<FeedGood>,
}

impl Feed {
    /// Parse and validate a feed document.
    pub fn from_yaml(source: &str) -> Result<Self, FeedError> {
        let root: Value =
            serde_yaml::from_str(source).map_err(|e| FeedError::InvalidYaml(e.to_string()))?;
        let root = root
            .as_mapping()
            .ok_or_else(|| FeedError::InvalidYaml("top level must be a mapping".to_string()))?;

        let shop = string_field(root, "shop")?;

        let categories = sequence_field(root, "categories")?
            .iter()
            .map(|entry| {
                let entry = mapping_entry(entry, "categories")?;
                Ok(FeedCategory {
                    id: int_field(entry, "id")?,
                    name: string_field(entry, "name")?,
                })
            })
            .collect::<Result<Vec<_>, FeedError>>()?;

        let known: HashSet<i64> = categories.iter().map(|c| c.id).collect();

        let goods = sequence_field(root, "goods")?
            .iter()
            .map(|entry| {
                let entry = mapping_entry(entry, "goods")?;
                let good = FeedGood {
                    id: int_field(entry, "id")?,
                    category: int_field(entry, "category")?,
                    model: string_field(entry, "model")?,
                    name: string_field(entry, "name")?,
                    quantity: amount_field(entry, "quantity")?,
                    price: amount_field(entry, "price")?,
                    price_rrc: amount_field(entry, "price_rrc")?,
                    parameters: parameters_field(entry)?,
                };
                if !known.contains(&good.category) {
                    return Err(FeedError::UnknownCategory(good.category));
                }
                Ok(good)
            })
            .collect::<Result<Vec<_>, FeedError>>()?;

        Ok(Self {
            shop,
            categories,
            goods,
        })
    }
}

fn field<'a>(map: &'a Mapping, key: &str) -> Result<&'a Value, FeedError> {
    match map.get(key) {
        Some(Value::Null) | None => Err(FeedError::MissingKey(key.to_string())),
        Some(value) => Ok(value),
    }
}

fn invalid(key: &str, reason: &str) -> FeedError {
    FeedError::InvalidValue {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn mapping_entry<'a>(value: &'a Value, key: &str) -> Result<&'a Mapping, FeedError> {
    value
        .as_mapping()
        .ok_or_else(|| invalid(key, "entries must be mappings"))
}

fn sequence_field<'a>(map: &'a Mapping, key: &str) -> Result<&'a Vec<Value>, FeedError> {
    field(map, key)?
        .as_sequence()
        .ok_or_else(|| invalid(key, "expected a list"))
}

fn string_field(map: &Mapping, key: &str) -> Result<String, FeedError> {
    let text = scalar_text(field(map, key)?).ok_or_else(|| invalid(key, "expected a string"))?;
    let text = text.trim().to_string();
    if text.is_empty() {
        return Err(invalid(key, "must not be empty"));
    }
    Ok(text)
}

fn int_field(map: &Mapping, key: &str) -> Result<i64, FeedError> {
    match field(map, key)? {
        Value::Number(n) => n.as_i64().ok_or_else(|| invalid(key, "expected an integer")),
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| invalid(key, "expected an integer")),
        _ => Err(invalid(key, "expected an integer")),
    }
}

fn amount_field(map: &Mapping, key: &str) -> Result<i64, FeedError> {
    let value = int_field(map, key)?;
    if value < 0 {
        return Err(invalid(key, "must not be negative"));
    }
    Ok(value)
}

fn parameters_field(map: &Mapping) -> Result<Vec<(String, String)>, FeedError> {
    let parameters = field(map, "parameters")?
        .as_mapping()
        .ok_or_else(|| invalid("parameters", "expected a mapping"))?;

    parameters
        .iter()
        .map(|(name, value)| {
            let name = scalar_text(name)
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty())
                .ok_or_else(|| invalid("parameters", "names must be non-empty strings"))?;
            let value = scalar_text(value).ok_or_else(|| invalid(&name, "expected a scalar"))?;
            Ok((name, value))
        })
        .collect()
}

/// Strings, numbers and booleans in their textual form.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
