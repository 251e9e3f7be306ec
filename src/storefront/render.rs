//! Pure conversion from products to render instructions. Applying them to a
//! document (HTML, terminal) happens in [`crate::output`].

use serde::Serialize;

use crate::catalog::Product;

pub const LOADING_MESSAGE: &str = "Chargement des produits...";
pub const ERROR_MESSAGE: &str = "❌ Erreur lors du chargement des produits";
pub const RETRY_LABEL: &str = "Réessayer";
pub const EMPTY_MESSAGE: &str = "Aucun produit disponible pour le moment.";
pub const BUY_LABEL: &str = "Acheter maintenant";
pub const PLACEHOLDER_GLYPH: &str = "🧶";

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RenderNode {
    Loading {
        message: &'static str,
    },
    Error {
        message: &'static str,
        retry_label: &'static str,
    },
    Empty {
        message: &'static str,
    },
    Card(ProductCard),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProductCard {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price_label: String,
    pub visual: CardVisual,
    pub purchase: PurchasePayload,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CardVisual {
    Photo { url: String, alt: String },
    Placeholder { glyph: &'static str },
}

/// What the buy button hands to the payment link generator.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PurchasePayload {
    pub product_name: String,
    pub price: f64,
}

pub fn loading() -> Vec<RenderNode> {
    vec![RenderNode::Loading {
        message: LOADING_MESSAGE,
    }]
}

pub fn failed() -> Vec<RenderNode> {
    vec![RenderNode::Error {
        message: ERROR_MESSAGE,
        retry_label: RETRY_LABEL,
    }]
}

pub fn render(products: &[Product]) -> Vec<RenderNode> {
    if products.is_empty() {
        return vec![RenderNode::Empty {
            message: EMPTY_MESSAGE,
        }];
    }
    products
        .iter()
        .map(|p| RenderNode::Card(card(p)))
        .collect()
}

fn card(product: &Product) -> ProductCard {
    let visual = match &product.image {
        Some(image) => CardVisual::Photo {
            url: image.url.clone(),
            alt: product.name.clone(),
        },
        None => CardVisual::Placeholder {
            glyph: PLACEHOLDER_GLYPH,
        },
    };
    ProductCard {
        id: product.id.clone(),
        name: product.name.clone(),
        description: product.description.clone(),
        price_label: product.price_label(),
        visual,
        purchase: PurchasePayload {
            product_name: product.name.clone(),
            price: product.price,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ProductImage;

    fn product(id: &str, with_image: bool) -> Product {
        Product {
            id: id.to_string(),
            name: format!("Produit {id}"),
            description: "Fait main".to_string(),
            price: 15.0,
            image: with_image.then(|| ProductImage {
                url: format!("https://cdn.example/{id}.jpg"),
                extra: Default::default(),
            }),
            active: true,
        }
    }

    #[test]
    fn empty_list_renders_explicit_empty_state() {
        assert_eq!(
            render(&[]),
            vec![RenderNode::Empty {
                message: EMPTY_MESSAGE
            }]
        );
    }

    #[test]
    fn one_card_per_product_in_input_order() {
        let nodes = render(&[product("b", true), product("a", false)]);
        let ids: Vec<&str> = nodes
            .iter()
            .map(|n| match n {
                RenderNode::Card(c) => c.id.as_str(),
                other => panic!("unexpected node {other:?}"),
            })
            .collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[test]
    fn missing_image_uses_placeholder_glyph() {
        let nodes = render(&[product("a", false)]);
        let RenderNode::Card(card) = &nodes[0] else {
            panic!("expected a card");
        };
        assert_eq!(
            card.visual,
            CardVisual::Placeholder {
                glyph: PLACEHOLDER_GLYPH
            }
        );
    }

    #[test]
    fn card_carries_purchase_payload() {
        let nodes = render(&[product("a", true)]);
        let RenderNode::Card(card) = &nodes[0] else {
            panic!("expected a card");
        };
        assert_eq!(card.purchase.product_name, "Produit a");
        assert_eq!(card.purchase.price, 15.0);
        assert_eq!(card.price_label, "15€");
        assert!(matches!(&card.visual, CardVisual::Photo { alt, .. } if alt == "Produit a"));
    }

    #[test]
    fn fixed_states_are_single_nodes() {
        assert!(matches!(loading().as_slice(), [RenderNode::Loading { .. }]));
        assert!(matches!(failed().as_slice(), [RenderNode::Error { retry_label, .. }] if *retry_label == RETRY_LABEL));
    }
}
