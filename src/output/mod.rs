pub mod page;

use colored::Colorize;
use serde::Serialize;

use crate::checkout::CheckoutLinks;
use crate::storefront::render::{CardVisual, ProductCard, RenderNode};
use crate::storefront::search::SortKey;
use crate::storefront::Storefront;
use crate::theme::Theme;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Html,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "text" | "txt" => Some(Self::Text),
            "json" => Some(Self::Json),
            "html" | "htm" => Some(Self::Html),
            _ => None,
        }
    }
}

pub fn infer_format_from_path(path: &str) -> Option<OutputFormat> {
    let lower = path.trim().to_lowercase();
    if lower.ends_with(".json") {
        return Some(OutputFormat::Json);
    }
    if lower.ends_with(".html") || lower.ends_with(".htm") {
        return Some(OutputFormat::Html);
    }
    if lower.ends_with(".txt") {
        return Some(OutputFormat::Text);
    }
    None
}

/// Everything a rendered listing needs besides the nodes themselves.
#[derive(Clone, Debug, Serialize)]
pub struct Listing<'a> {
    pub theme: Theme,
    pub search: &'a str,
    pub sort: SortKey,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub nodes: &'a [RenderNode],
}

impl<'a> Listing<'a> {
    pub fn new(storefront: &'a Storefront, nodes: &'a [RenderNode], theme: Theme) -> Self {
        Self {
            theme,
            search: storefront.search_term(),
            sort: storefront.sort_key(),
            summary: storefront.results_summary(),
            nodes,
        }
    }
}

pub fn render(format: OutputFormat, listing: &Listing<'_>, checkout: Option<&CheckoutLinks>) -> Vec<u8> {
    match format {
        OutputFormat::Text => render_text(listing),
        OutputFormat::Json => render_json(listing),
        OutputFormat::Html => page::render_page(listing, checkout),
    }
}

pub fn render_text(listing: &Listing<'_>) -> Vec<u8> {
    let mut out = String::new();
    if let Some(summary) = &listing.summary {
        out.push_str(&summary.dimmed().to_string());
        out.push('\n');
    }
    for node in listing.nodes {
        match node {
            RenderNode::Loading { message } => {
                out.push_str(&message.yellow().to_string());
                out.push('\n');
            }
            RenderNode::Error {
                message,
                retry_label,
            } => {
                out.push_str(&format!("{} [{}]\n", message.red(), retry_label));
            }
            RenderNode::Empty { message } => {
                out.push_str(message);
                out.push('\n');
            }
            RenderNode::Card(card) => push_card_text(&mut out, card),
        }
    }
    out.into_bytes()
}

fn push_card_text(out: &mut String, card: &ProductCard) {
    let visual = match &card.visual {
        CardVisual::Photo { url, .. } => url.as_str(),
        CardVisual::Placeholder { glyph } => *glyph,
    };
    out.push_str(&format!(
        "{}  {}\n    {}\n    {}\n",
        card.name.bold(),
        card.price_label.green(),
        card.description,
        visual.dimmed()
    ));
}

pub fn render_json(listing: &Listing<'_>) -> Vec<u8> {
    serde_json::to_vec_pretty(listing).unwrap_or_else(|_| b"{}\n".to_vec())
}

pub fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Markup for the products grid. Buy buttons link straight to checkout when
/// `checkout` is given, otherwise they keep the data attributes only.
pub fn render_nodes_html(nodes: &[RenderNode], checkout: Option<&CheckoutLinks>) -> String {
    let mut out = String::new();
    for node in nodes {
        match node {
            RenderNode::Loading { message } => out.push_str(&format!(
                "<div class=\"loading-container\">\n  <div class=\"loading-spinner\"></div>\n  <p>{}</p>\n</div>\n",
                escape_html(message)
            )),
            RenderNode::Error {
                message,
                retry_label,
            } => out.push_str(&format!(
                "<div class=\"error-container\">\n  <p>{}</p>\n  <button onclick=\"location.reload()\" class=\"retry-button\">{}</button>\n</div>\n",
                escape_html(message),
                escape_html(retry_label)
            )),
            RenderNode::Empty { message } => out.push_str(&format!(
                "<div class=\"no-products\">\n  <p>{}</p>\n</div>\n",
                escape_html(message)
            )),
            RenderNode::Card(card) => out.push_str(&card_html(card, checkout)),
        }
    }
    out
}

fn card_html(card: &ProductCard, checkout: Option<&CheckoutLinks>) -> String {
    let image = match &card.visual {
        CardVisual::Photo { url, alt } => format!(
            "<img src=\"{}\" alt=\"{}\" class=\"product-photo\">",
            escape_html(url),
            escape_html(alt)
        ),
        CardVisual::Placeholder { glyph } => {
            format!("<div class=\"placeholder-image\">{glyph}</div>")
        }
    };
    let href = checkout
        .and_then(|links| links.for_payload(&card.purchase).ok())
        .map(|url| url.to_string())
        .unwrap_or_else(|| "#".to_string());
    let price = crate::catalog::format_amount(card.purchase.price);

    format!(
        r#"<div class="product-card" data-id="{id}">
  <div class="product-image">
    {image}
  </div>
  <div class="product-info">
    <h4 class="product-name">{name}</h4>
    <p class="product-description">{description}</p>
    <div class="product-price">{price_label}</div>
    <a href="{href}" class="buy-button" data-product="{product}" data-price="{price}" target="_blank" rel="noopener">
      {buy}
    </a>
  </div>
</div>
"#,
        id = escape_html(&card.id),
        image = image,
        name = escape_html(&card.name),
        description = escape_html(&card.description),
        price_label = escape_html(&card.price_label),
        href = escape_html(&href),
        product = escape_html(&card.purchase.product_name),
        price = escape_html(&price),
        buy = crate::storefront::render::BUY_LABEL,
    )
}
