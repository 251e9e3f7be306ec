use std::io::Write;
use std::path::PathBuf;

use clap::{error::ErrorKind, Parser};
use reqwest::Url;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::checkout::{CheckoutError, CheckoutLinks, DEFAULT_BUSINESS};
use crate::cli::args::{
    BrowseArgs, CheckoutConfigArgs, CliArgs, Command, ServeArgs, ThemeArgs,
};
use crate::cli::{interactive, validation};
use crate::config::{self, ConfigFile};
use crate::output::{self, infer_format_from_path, Listing, OutputFormat};
use crate::proxy::{self, ProxyState, PRODUCTS_ROUTE};
use crate::source::{
    build_http_client, CredentialSource, RecordSource, SourceError, DEFAULT_API_BASE,
    DEFAULT_BASE_ID_ENV, DEFAULT_TABLE, DEFAULT_TOKEN_ENV,
};
use crate::storefront::loader::ProductLoader;
use crate::storefront::search::SortKey;
use crate::storefront::{Command as StoreCommand, Presentation, Storefront};
use crate::theme::{Theme, ThemeError, ThemeStore};

pub const DEFAULT_BIND: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_TIMEOUT: u64 = 10;
pub const DEFAULT_PRODUCTS_URL: &str = "http://localhost:3000/api/products";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Invalid(String),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Theme(#[from] ThemeError),

    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {source}")]
    Serve {
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write output '{target}': {source}")]
    Output {
        target: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to build runtime: {source}")]
    Runtime {
        #[source]
        source: std::io::Error,
    },

    #[error("products could not be loaded from {endpoint}")]
    LoadFailed { endpoint: String },
}

impl From<String> for AppError {
    fn from(message: String) -> Self {
        Self::Invalid(message)
    }
}

fn format_kv_line(label: &str, value: &str) {
    println!(":: {:<10}: {}", label, value);
}

fn init_tracing(verbose: u8, no_color: bool) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(!no_color)
        .try_init();
}

#[derive(Clone, Debug)]
struct ServeConfig {
    bind: String,
    port: u16,
    api_base: Url,
    table: String,
    token_env: String,
    base_id_env: String,
    timeout: u64,
    proxy_url: Option<String>,
}

#[derive(Clone, Debug)]
struct BrowseConfig {
    products_url: Url,
    search: Option<String>,
    sort: Option<SortKey>,
    interactive: bool,
    output: Option<String>,
    format: OutputFormat,
    checkout: Option<CheckoutLinks>,
    theme_path: Option<PathBuf>,
    timeout: u64,
    proxy_url: Option<String>,
}

fn parse_url(label: &str, raw: &str) -> Result<Url, String> {
    Url::parse(raw).map_err(|e| format!("invalid {label} '{raw}': {e}"))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn build_serve_config(args: ServeArgs, cfg: &ConfigFile) -> Result<ServeConfig, String> {
    let api_base_raw = args
        .api_base
        .or_else(|| cfg.api_base.clone())
        .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
    let timeout = args.http.timeout.or(cfg.timeout).unwrap_or(DEFAULT_TIMEOUT);
    if timeout == 0 {
        return Err("invalid timeout, expected positive integer".to_string());
    }
    let port = args.port.or(cfg.port).unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err("invalid port, expected 1-65535".to_string());
    }

    Ok(ServeConfig {
        bind: args
            .bind
            .or_else(|| cfg.bind.clone())
            .unwrap_or_else(|| DEFAULT_BIND.to_string()),
        port,
        api_base: parse_url("api_base", &api_base_raw)?,
        table: args
            .table
            .or_else(|| cfg.table.clone())
            .unwrap_or_else(|| DEFAULT_TABLE.to_string()),
        token_env: args
            .token_env
            .or_else(|| cfg.token_env.clone())
            .unwrap_or_else(|| DEFAULT_TOKEN_ENV.to_string()),
        base_id_env: args
            .base_id_env
            .or_else(|| cfg.base_id_env.clone())
            .unwrap_or_else(|| DEFAULT_BASE_ID_ENV.to_string()),
        timeout,
        proxy_url: non_empty(args.http.proxy_url.or_else(|| cfg.proxy_url.clone())),
    })
}

/// `None` when no return page is configured; buy buttons then stay inert.
fn build_checkout_links(
    args: &CheckoutConfigArgs,
    cfg: &ConfigFile,
) -> Result<Option<CheckoutLinks>, CheckoutError> {
    let Some(return_url) = non_empty(args.return_url.clone().or_else(|| cfg.return_url.clone()))
    else {
        return Ok(None);
    };
    let business = non_empty(
        args.paypal_business
            .clone()
            .or_else(|| cfg.paypal_business.clone()),
    )
    .unwrap_or_else(|| DEFAULT_BUSINESS.to_string());
    CheckoutLinks::new(&business, &return_url).map(Some)
}

fn theme_path(flag: Option<&str>, cfg: &ConfigFile) -> Option<PathBuf> {
    flag.map(str::to_string)
        .or_else(|| cfg.theme_file.clone())
        .map(|p| config::expand_tilde(&p))
        .or_else(config::default_theme_path)
}

fn build_browse_config(args: BrowseArgs, cfg: &ConfigFile) -> Result<BrowseConfig, String> {
    let products_raw = args
        .url
        .or_else(|| cfg.products_url.clone())
        .unwrap_or_else(|| DEFAULT_PRODUCTS_URL.to_string());

    let format = match args.format.as_deref() {
        Some(raw) => OutputFormat::parse(raw)
            .ok_or_else(|| format!("invalid --format '{raw}', expected text, json or html"))?,
        None => args
            .output
            .as_deref()
            .and_then(infer_format_from_path)
            .unwrap_or(OutputFormat::Text),
    };

    let timeout = args.http.timeout.or(cfg.timeout).unwrap_or(DEFAULT_TIMEOUT);
    if timeout == 0 {
        return Err("invalid timeout, expected positive integer".to_string());
    }

    Ok(BrowseConfig {
        products_url: parse_url("products url", &products_raw)?,
        search: args.search,
        sort: args.sort.as_deref().map(SortKey::parse),
        interactive: args.interactive,
        output: non_empty(args.output),
        format,
        checkout: build_checkout_links(&args.checkout, cfg).map_err(|e| e.to_string())?,
        theme_path: theme_path(args.theme_file.as_deref(), cfg),
        timeout,
        proxy_url: non_empty(args.http.proxy_url.or_else(|| cfg.proxy_url.clone())),
    })
}

async fn run_serve(run: ServeConfig) -> Result<(), AppError> {
    let client = build_http_client(run.timeout, run.proxy_url.as_deref())?;
    for var in [&run.token_env, &run.base_id_env] {
        if std::env::var_os(var).is_none() {
            warn!(variable = %var, "credential variable is not set, product requests will fail");
        }
    }

    let state = ProxyState {
        source: RecordSource::new(client, run.api_base.clone(), run.table.clone()),
        credentials: CredentialSource::from_env(run.token_env.clone(), run.base_id_env.clone()),
    };

    let addr = format!("{}:{}", run.bind, run.port);
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::Bind {
            addr: addr.clone(),
            source: e,
        })?;

    format_kv_line("Listening", &format!("http://{addr}{PRODUCTS_ROUTE}"));
    format_kv_line("Table", &run.table);
    format_kv_line("Upstream", run.api_base.as_str());
    info!(%addr, "proxy started");

    proxy::serve(listener, state)
        .await
        .map_err(|e| AppError::Serve { source: e })
}

async fn run_browse(run: BrowseConfig) -> Result<(), AppError> {
    let client = build_http_client(run.timeout, run.proxy_url.as_deref())?;
    let loader = ProductLoader::new(client, run.products_url.clone());
    let mut storefront = Storefront::new();
    storefront.load(&loader).await;

    if run.interactive {
        let mut stdout = std::io::stdout();
        let nodes = storefront.render();
        let io_err = |e: std::io::Error| AppError::Output {
            target: "stdout".to_string(),
            source: e,
        };
        interactive::emit(&mut stdout, &storefront, &nodes).map_err(io_err)?;
        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        return interactive::run(stdin, &mut stdout, &mut storefront, &loader)
            .await
            .map_err(io_err);
    }

    if let Some(term) = run.search.clone() {
        storefront.dispatch(StoreCommand::Search(term));
    }
    if let Some(key) = run.sort {
        storefront.dispatch(StoreCommand::Sort(key));
    }

    let theme = match run.theme_path.as_ref() {
        Some(path) => ThemeStore::new(path).load()?,
        None => Theme::default(),
    };
    let nodes = storefront.render();
    let listing = Listing::new(&storefront, &nodes, theme);
    let bytes = output::render(run.format, &listing, run.checkout.as_ref());

    match run.output.as_deref() {
        Some(path) => {
            tokio::fs::write(path, &bytes)
                .await
                .map_err(|e| AppError::Output {
                    target: path.to_string(),
                    source: e,
                })?;
            info!(path, count = storefront.working_view().len(), "listing written");
        }
        None => {
            let mut stdout = std::io::stdout();
            stdout
                .write_all(&bytes)
                .and_then(|_| stdout.flush())
                .map_err(|e| AppError::Output {
                    target: "stdout".to_string(),
                    source: e,
                })?;
        }
    }

    if storefront.presentation() == Presentation::Failed {
        return Err(AppError::LoadFailed {
            endpoint: run.products_url.to_string(),
        });
    }
    Ok(())
}

fn run_theme(args: ThemeArgs, cfg: &ConfigFile) -> Result<(), AppError> {
    let path = theme_path(args.theme_file.as_deref(), cfg)
        .ok_or_else(|| AppError::Invalid("cannot locate home directory, pass --theme-file".into()))?;
    let store = ThemeStore::new(path);

    let theme = if args.toggle {
        store.toggle()?
    } else if let Some(raw) = args.set.as_deref() {
        let theme = Theme::parse(raw)
            .ok_or_else(|| AppError::Invalid(format!("invalid theme '{raw}'")))?;
        store.save(theme)?;
        theme
    } else {
        store.load()?
    };

    format_kv_line("Theme", theme.as_str());
    format_kv_line("Toggle", &format!("{} {}", theme.icon(), theme.toggle_label()));
    Ok(())
}

fn run_init_config(config_flag: Option<&str>) -> Result<(), AppError> {
    let path = match config_flag {
        Some(p) => config::expand_tilde(p),
        None => config::default_config_path()
            .ok_or_else(|| AppError::Invalid("cannot locate home directory, pass --config".into()))?,
    };
    if config::ensure_default_config_file(&path)? {
        println!("wrote default config to {}", path.display());
    } else {
        println!("config already exists at {}", path.display());
    }
    Ok(())
}

fn load_user_config(flag: Option<&str>) -> Result<ConfigFile, String> {
    match flag {
        Some(p) => config::load_config(&config::expand_tilde(p), false),
        None => match config::default_config_path() {
            Some(path) => config::load_config(&path, true),
            None => Ok(ConfigFile::default()),
        },
    }
}

fn block_on<F>(future: F) -> Result<(), AppError>
where
    F: std::future::Future<Output = Result<(), AppError>>,
{
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| AppError::Runtime { source: e })?;
    rt.block_on(future)
}

pub fn run_cli() -> Result<(), AppError> {
    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                print!("{e}");
                return Ok(());
            }
            _ => return Err(AppError::Invalid(e.to_string())),
        },
    };

    let cfg = load_user_config(args.config.as_deref())?;
    let no_color = args.no_color || cfg.no_color.unwrap_or(false);
    if no_color {
        colored::control::set_override(false);
    }
    init_tracing(args.verbose, no_color);
    validation::validate(&args)?;

    match args.command {
        Command::Serve(serve) => {
            let run = build_serve_config(serve, &cfg)?;
            block_on(run_serve(run))
        }
        Command::Browse(browse) => {
            let run = build_browse_config(browse, &cfg)?;
            block_on(run_browse(run))
        }
        Command::CheckoutLink(checkout) => {
            let links = build_checkout_links(&checkout.checkout, &cfg)?.ok_or_else(|| {
                AppError::Invalid("missing --return-url (or return_url in config)".into())
            })?;
            println!("{}", links.purchase_url(&checkout.name, &checkout.price)?);
            Ok(())
        }
        Command::Theme(theme) => run_theme(theme, &cfg),
        Command::InitConfig => run_init_config(args.config.as_deref()),
    }
}
