//! # Storefront
//!
//! Client side of the catalogue: loads the product list from the proxy, keeps
//! the full set alongside a working view, and turns UI actions into
//! search/sort operations on that view.
//!
//! ## State
//! - full set: the list exactly as the proxy returned it (natural order)
//! - working view: an independent copy that search and sort rewrite
//! - presentation: loading, failed or ready
//!
//! Search always rebuilds the working view from the full set and does not
//! reapply the last sort key. Sort rewrites the working view in place.

use tracing::{debug, error};

pub mod debounce;
pub mod loader;
pub mod render;
pub mod search;

use crate::catalog::Product;
use loader::{LoadError, ProductLoader};
use render::RenderNode;
use search::{filter_products, sort_products, SortKey};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Presentation {
    Loading,
    Failed,
    Ready,
}

/// Raw UI events as they come off the page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UiEvent {
    /// Text typed into the search box. Debounced by the event source.
    SearchInput(String),
    /// Key pressed in the search box, with the box's current value.
    SearchKey { key: String, value: String },
    SortChange(String),
    ClearClick,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Search(String),
    Sort(SortKey),
    ClearSearch,
}

impl UiEvent {
    pub fn command(self) -> Option<Command> {
        match self {
            UiEvent::SearchInput(term) => Some(Command::Search(term)),
            UiEvent::SearchKey { key, value } => match key.as_str() {
                "Enter" => Some(Command::Search(value)),
                "Escape" => Some(Command::ClearSearch),
                _ => None,
            },
            UiEvent::SortChange(key) => Some(Command::Sort(SortKey::parse(&key))),
            UiEvent::ClearClick => Some(Command::ClearSearch),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Storefront {
    full: Vec<Product>,
    working: Vec<Product>,
    presentation: Presentation,
    search_term: String,
    sort_key: SortKey,
}

impl Default for Storefront {
    fn default() -> Self {
        Self::new()
    }
}

impl Storefront {
    pub fn new() -> Self {
        Self {
            full: Vec::new(),
            working: Vec::new(),
            presentation: Presentation::Loading,
            search_term: String::new(),
            sort_key: SortKey::Natural,
        }
    }

    pub fn presentation(&self) -> Presentation {
        self.presentation
    }

    pub fn products(&self) -> &[Product] {
        &self.full
    }

    pub fn working_view(&self) -> &[Product] {
        &self.working
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn sort_key(&self) -> SortKey {
        self.sort_key
    }

    pub async fn load(&mut self, loader: &ProductLoader) -> Vec<RenderNode> {
        self.presentation = Presentation::Loading;
        let result = loader.fetch().await;
        self.finish_load(result);
        self.render()
    }

    pub fn finish_load(&mut self, result: Result<Vec<Product>, LoadError>) {
        match result {
            Ok(products) => {
                debug!(count = products.len(), "products loaded");
                self.working = products.clone();
                self.full = products;
                self.search_term.clear();
                self.sort_key = SortKey::Natural;
                self.presentation = Presentation::Ready;
            }
            Err(e) => {
                error!(error = %e, "failed to load products");
                self.presentation = Presentation::Failed;
            }
        }
    }

    pub fn dispatch(&mut self, command: Command) -> Vec<RenderNode> {
        match command {
            Command::Search(term) => self.search(&term),
            Command::Sort(key) => self.sort(key),
            Command::ClearSearch => self.clear_search(),
        }
        self.render()
    }

    pub fn search(&mut self, term: &str) {
        self.search_term = term.to_string();
        self.sort_key = SortKey::Natural;
        self.working = filter_products(&self.full, term);
    }

    pub fn sort(&mut self, key: SortKey) {
        self.sort_key = key;
        sort_products(&mut self.working, key, &self.full);
    }

    pub fn clear_search(&mut self) {
        self.search_term.clear();
        self.sort_key = SortKey::Natural;
        self.working = self.full.clone();
    }

    /// `"<n> produit(s) trouvé(s)"` while a search is active.
    pub fn results_summary(&self) -> Option<String> {
        if self.search_term.trim().is_empty() {
            return None;
        }
        Some(format!("{} produit(s) trouvé(s)", self.working.len()))
    }

    pub fn render(&self) -> Vec<RenderNode> {
        match self.presentation {
            Presentation::Loading => render::loading(),
            Presentation::Failed => render::failed(),
            Presentation::Ready => render::render(&self.working),
        }
    }
}
