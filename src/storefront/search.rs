use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Serialize, Serializer};

use crate::catalog::Product;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortKey {
    NameAsc,
    NameDesc,
    PriceAsc,
    PriceDesc,
    /// Upstream display order.
    #[default]
    Natural,
}

impl SortKey {
    /// Unrecognised keys fall back to the natural order.
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "nom" => Self::NameAsc,
            "nom-desc" => Self::NameDesc,
            "prix-asc" => Self::PriceAsc,
            "prix-desc" => Self::PriceDesc,
            _ => Self::Natural,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::NameAsc => "nom",
            Self::NameDesc => "nom-desc",
            Self::PriceAsc => "prix-asc",
            Self::PriceDesc => "prix-desc",
            Self::Natural => "ordre",
        }
    }
}

impl Serialize for SortKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Case-insensitive substring match on name or description, always taken from
/// the full set. A blank term returns the full set in natural order.
pub fn filter_products(full: &[Product], term: &str) -> Vec<Product> {
    if term.trim().is_empty() {
        return full.to_vec();
    }
    let needle = term.to_lowercase();
    full.iter()
        .filter(|p| {
            p.name.to_lowercase().contains(&needle)
                || p.description.to_lowercase().contains(&needle)
        })
        .cloned()
        .collect()
}

/// Reorders `view` in place. `full` is only consulted for the natural order.
pub fn sort_products(view: &mut [Product], key: SortKey, full: &[Product]) {
    match key {
        SortKey::NameAsc => view.sort_by(|a, b| collate(&a.name, &b.name)),
        SortKey::NameDesc => view.sort_by(|a, b| collate(&b.name, &a.name)),
        SortKey::PriceAsc => view.sort_by(|a, b| compare_price(a.price, b.price)),
        SortKey::PriceDesc => view.sort_by(|a, b| compare_price(b.price, a.price)),
        SortKey::Natural => {
            let positions: HashMap<&str, usize> = full
                .iter()
                .enumerate()
                .map(|(i, p)| (p.id.as_str(), i))
                .collect();
            view.sort_by_key(|p| positions.get(p.id.as_str()).copied().unwrap_or(usize::MAX));
        }
    }
}

fn compare_price(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

/// Collation key ordered by base letters first, then accents, then case, so
/// `bonnet < Écharpe < étole < Étole < zèbre`.
#[derive(PartialEq, Eq, PartialOrd, Ord)]
struct CollationKey {
    base: String,
    accents: Vec<bool>,
    uppercase: Vec<bool>,
}

impl CollationKey {
    fn new(value: &str) -> Self {
        let mut key = Self {
            base: String::with_capacity(value.len()),
            accents: Vec::with_capacity(value.len()),
            uppercase: Vec::with_capacity(value.len()),
        };
        for c in value.chars() {
            key.uppercase.push(c.is_uppercase());
            let mut accented = false;
            for lower in c.to_lowercase() {
                match fold_accent(lower) {
                    Some(base) => {
                        key.base.push_str(base);
                        accented = true;
                    }
                    None => key.base.push(lower),
                }
            }
            key.accents.push(accented);
        }
        key
    }
}

fn fold_accent(c: char) -> Option<&'static str> {
    let base = match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' | 'ă' | 'ą' => "a",
        'æ' => "ae",
        'ç' | 'ć' | 'č' => "c",
        'ď' => "d",
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ė' | 'ę' | 'ě' => "e",
        'ì' | 'í' | 'î' | 'ï' | 'ī' | 'į' => "i",
        'ł' => "l",
        'ñ' | 'ń' | 'ň' => "n",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' | 'ő' => "o",
        'œ' => "oe",
        'ř' => "r",
        'ś' | 'š' => "s",
        'ß' => "ss",
        'ť' => "t",
        'ù' | 'ú' | 'û' | 'ü' | 'ū' | 'ů' | 'ű' => "u",
        'ý' | 'ÿ' => "y",
        'ź' | 'ż' | 'ž' => "z",
        _ => return None,
    };
    Some(base)
}

/// Locale-aware string comparison for product names.
pub fn collate(a: &str, b: &str) -> Ordering {
    CollationKey::new(a)
        .cmp(&CollationKey::new(b))
        .then_with(|| a.cmp(b))
}
