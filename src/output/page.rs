use super::{escape_html, render_nodes_html, Listing};
use crate::checkout::CheckoutLinks;
use crate::storefront::search::SortKey;

const SORT_OPTIONS: [(SortKey, &str); 5] = [
    (SortKey::Natural, "Ordre par défaut"),
    (SortKey::NameAsc, "Nom (A-Z)"),
    (SortKey::NameDesc, "Nom (Z-A)"),
    (SortKey::PriceAsc, "Prix croissant"),
    (SortKey::PriceDesc, "Prix décroissant"),
];

fn sort_options(selected: SortKey) -> String {
    SORT_OPTIONS
        .iter()
        .map(|(key, label)| {
            let attr = if *key == selected { " selected" } else { "" };
            format!(
                "          <option value=\"{}\"{attr}>{label}</option>\n",
                key.as_str()
            )
        })
        .collect()
}

/// Standalone storefront document: theme toggle, search controls, summary and
/// the products grid.
pub fn render_page(listing: &Listing<'_>, checkout: Option<&CheckoutLinks>) -> Vec<u8> {
    let grid = render_nodes_html(listing.nodes, checkout);
    let summary = listing
        .summary
        .as_deref()
        .map(|s| format!("<p class=\"search-results\">{}</p>", escape_html(s)))
        .unwrap_or_default();
    let clear_hidden = if listing.search.trim().is_empty() {
        " hidden"
    } else {
        ""
    };

    let html = format!(
        r####"<!DOCTYPE html>
<html lang="fr" data-theme="{theme}">
<head>
  <meta charset="utf-8"/>
  <meta content="width=device-width, initial-scale=1.0" name="viewport"/>
  <title>Vitrine</title>
</head>
<body>
  <header class="header">
    <h1 class="logo">Vitrine</h1>
    <button id="themeToggle" class="theme-toggle" type="button" aria-label="{toggle_label}">
      <span class="theme-icon">{icon}</span>
    </button>
  </header>

  <main>
    <section class="products">
      <div class="search-sort-container">
        <div class="search-box">
          <input id="searchInput" type="text" placeholder="Rechercher un produit..." value="{search}"/>
          <button id="clearSearch" class="clear-search{clear_hidden}" type="button">✕</button>
        </div>
        <select id="sortSelect">
{options}        </select>
      </div>
      {summary}
      <div class="products-grid">
{grid}      </div>
    </section>
  </main>
</body>
</html>
"####,
        theme = listing.theme.as_str(),
        toggle_label = listing.theme.toggle_label(),
        icon = listing.theme.icon(),
        search = escape_html(listing.search),
        clear_hidden = clear_hidden,
        options = sort_options(listing.sort),
        summary = summary,
        grid = grid,
    );
    html.into_bytes()
}
