//! Product data model shared by the proxy endpoint and the storefront.
//!
//! Upstream records arrive as a loose field map. Each field is normalised on
//! its own, so a malformed price never blanks the name or the image.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const FIELD_NAME: &str = "Nom";
pub const FIELD_DESCRIPTION: &str = "Description";
pub const FIELD_PRICE: &str = "Prix";
pub const FIELD_IMAGE: &str = "Image";
pub const FIELD_ACTIVE: &str = "Actif";
pub const FIELD_ORDER: &str = "Ordre";

pub const DEFAULT_NAME: &str = "Produit sans nom";
pub const DEFAULT_DESCRIPTION: &str = "Aucune description";

/// Message returned to clients whenever the product list cannot be served.
pub const LOAD_FAILED_MESSAGE: &str = "Erreur lors du chargement des produits";

/// One page of the upstream list-records response.
#[derive(Clone, Debug, Deserialize)]
pub struct RecordPage {
    pub records: Vec<ProductRecord>,
    #[serde(default)]
    pub offset: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ProductRecord {
    pub id: String,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

/// An image attachment. Only `url` is interpreted; the remaining attachment
/// metadata (filename, size, thumbnails, ...) is passed through untouched.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProductImage {
    pub url: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: f64,
    #[serde(default)]
    pub image: Option<ProductImage>,
    #[serde(default)]
    pub active: bool,
}

impl Product {
    pub fn from_record(record: ProductRecord) -> Self {
        let fields = &record.fields;
        Self {
            name: text_field(fields.get(FIELD_NAME)).unwrap_or_else(|| DEFAULT_NAME.to_string()),
            description: text_field(fields.get(FIELD_DESCRIPTION))
                .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
            price: price_field(fields.get(FIELD_PRICE)),
            image: first_attachment(fields.get(FIELD_IMAGE)),
            active: flag_field(fields.get(FIELD_ACTIVE)),
            id: record.id,
        }
    }

    /// Display price in the shop currency, e.g. `20€` or `12.5€`.
    pub fn price_label(&self) -> String {
        format!("{}€", format_amount(self.price))
    }
}

/// Formats a price the way it is shown and sent to the payment page: whole
/// amounts without decimals.
pub fn format_amount(price: f64) -> String {
    format!("{price}")
}

fn text_field(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        _ => None,
    }
}

fn price_field(value: Option<&Value>) -> f64 {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|p| p.is_finite()).unwrap_or(0.0)
}

fn flag_field(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|v| v != 0.0),
        _ => false,
    }
}

fn first_attachment(value: Option<&Value>) -> Option<ProductImage> {
    let first = value?.as_array()?.first()?;
    serde_json::from_value(first.clone()).ok()
}

/// Body of every `/api/products` response except the 405 rejection.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProductsEnvelope {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub products: Option<Vec<Product>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub timestamp: String,
}

impl ProductsEnvelope {
    pub fn success(products: Vec<Product>) -> Self {
        Self {
            success: true,
            products: Some(products),
            error: None,
            timestamp: timestamp(),
        }
    }

    pub fn failure(message: &str) -> Self {
        Self {
            success: false,
            products: None,
            error: Some(message.to_string()),
            timestamp: timestamp(),
        }
    }
}

/// Current time as ISO-8601 UTC with millisecond precision.
pub fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
