//! Line-driven storefront session for `browse --interactive`.
//!
//! Plain lines behave like typing in the search box and are debounced.
//! Lines starting with `:` are commands:
//!
//! | line            | effect                               |
//! |-----------------|--------------------------------------|
//! | `:find <term>`  | search immediately (Enter)           |
//! | `:sort <key>`   | sort the current view                |
//! | `:clear`        | clear the search (clear button)      |
//! | `:reload`       | fetch the products again             |
//! | `:quit`         | end the session                      |

use std::io::Write;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tracing::debug;

use crate::output::{render_text, Listing};
use crate::storefront::debounce::{debounce, SEARCH_DEBOUNCE};
use crate::storefront::loader::ProductLoader;
use crate::storefront::render::RenderNode;
use crate::storefront::{Command, Storefront, UiEvent};
use crate::theme::Theme;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Input {
    Typed(String),
    Event(UiEvent),
    Reload,
    Quit,
    Unknown(String),
}

pub fn parse_line(line: &str) -> Input {
    let line = line.trim_end_matches(['\r', '\n']);
    let Some(rest) = line.strip_prefix(':') else {
        return Input::Typed(line.to_string());
    };
    let (name, arg) = match rest.split_once(' ') {
        Some((name, arg)) => (name, arg),
        None => (rest, ""),
    };
    match name {
        "find" | "f" => Input::Event(UiEvent::SearchKey {
            key: "Enter".to_string(),
            value: arg.to_string(),
        }),
        "sort" | "s" => Input::Event(UiEvent::SortChange(arg.trim().to_string())),
        "clear" | "c" => Input::Event(UiEvent::ClearClick),
        "reload" | "r" => Input::Reload,
        "quit" | "q" => Input::Quit,
        _ => Input::Unknown(name.to_string()),
    }
}

pub(crate) fn emit<W: Write>(out: &mut W, storefront: &Storefront, nodes: &[RenderNode]) -> std::io::Result<()> {
    let listing = Listing::new(storefront, nodes, Theme::default());
    out.write_all(&render_text(&listing))?;
    out.flush()
}

/// Runs until `:quit` or end of input. Typed text still pending in the
/// debouncer when input ends is applied before returning.
pub async fn run<R, W>(
    input: R,
    out: &mut W,
    storefront: &mut Storefront,
    loader: &ProductLoader,
) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let (typed_tx, typed_rx) = mpsc::channel(16);
    let mut debounced = debounce(typed_rx, SEARCH_DEBOUNCE);
    let mut lines = input.lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match parse_line(&line) {
                    Input::Typed(text) => {
                        let event = UiEvent::SearchInput(text);
                        if let Some(Command::Search(term)) = event.command() {
                            let _ = typed_tx.send(term).await;
                        }
                    }
                    Input::Event(event) => {
                        if let Some(command) = event.command() {
                            let nodes = storefront.dispatch(command);
                            emit(out, storefront, &nodes)?;
                        }
                    }
                    Input::Reload => {
                        let nodes = storefront.load(loader).await;
                        emit(out, storefront, &nodes)?;
                    }
                    Input::Quit => return Ok(()),
                    Input::Unknown(name) => {
                        writeln!(out, "unknown command ':{name}'")?;
                    }
                }
            }
            Some(term) = debounced.recv() => {
                debug!(term = %term, "debounced search");
                let nodes = storefront.dispatch(Command::Search(term));
                emit(out, storefront, &nodes)?;
            }
        }
    }

    drop(typed_tx);
    while let Some(term) = debounced.recv().await {
        let nodes = storefront.dispatch(Command::Search(term));
        emit(out, storefront, &nodes)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Product;
    use crate::storefront::search::SortKey;

    fn product(id: &str, name: &str, price: f64) -> Product {
        Product {
            id: id.to_string(),
            name: name.to_string(),
            description: String::new(),
            price,
            image: None,
            active: true,
        }
    }

    fn loaded() -> Storefront {
        let mut storefront = Storefront::new();
        storefront.finish_load(Ok(vec![
            product("a", "Shawl", 20.0),
            product("b", "Beanie", 10.0),
            product("c", "Beret", 5.0),
        ]));
        storefront
    }

    fn unused_loader() -> ProductLoader {
        ProductLoader::new(
            reqwest::Client::new(),
            reqwest::Url::parse("http://127.0.0.1:9/api/products").unwrap(),
        )
    }

    #[test]
    fn parses_commands_and_plain_text() {
        assert_eq!(parse_line("laine"), Input::Typed("laine".to_string()));
        assert_eq!(
            parse_line(":find bonnet rouge"),
            Input::Event(UiEvent::SearchKey {
                key: "Enter".to_string(),
                value: "bonnet rouge".to_string()
            })
        );
        assert_eq!(
            parse_line(":sort prix-asc"),
            Input::Event(UiEvent::SortChange("prix-asc".to_string()))
        );
        assert_eq!(parse_line(":clear"), Input::Event(UiEvent::ClearClick));
        assert_eq!(parse_line(":q"), Input::Quit);
        assert_eq!(parse_line(":reload"), Input::Reload);
        assert_eq!(parse_line(":zoom"), Input::Unknown("zoom".to_string()));
    }

    #[tokio::test]
    async fn commands_apply_in_order() {
        colored::control::set_override(false);
        let mut storefront = loaded();
        let mut out = Vec::new();
        let input: &[u8] = b":find be\n:sort prix-asc\n:quit\n:clear\n";

        run(input, &mut out, &mut storefront, &unused_loader())
            .await
            .unwrap();

        let ids: Vec<&str> = storefront.working_view().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "b"]);
        assert_eq!(storefront.sort_key(), SortKey::PriceAsc);
        assert!(String::from_utf8(out).unwrap().contains("2 produit(s) trouvé(s)"));
    }

    #[tokio::test(start_paused = true)]
    async fn typed_text_is_applied_after_input_ends() {
        let mut storefront = loaded();
        let mut out = Vec::new();
        let input: &[u8] = b"s\nsh\nshawl\n";

        run(input, &mut out, &mut storefront, &unused_loader())
            .await
            .unwrap();

        assert_eq!(storefront.search_term(), "shawl");
        let ids: Vec<&str> = storefront.working_view().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["a"]);
    }
}
