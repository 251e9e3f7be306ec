use reqwest::Url;

use crate::cli::args::{BrowseArgs, CheckoutConfigArgs, CliArgs, Command, HttpArgs, ServeArgs};
use crate::output::OutputFormat;
use crate::theme::Theme;

pub fn validate(args: &CliArgs) -> Result<(), String> {
    match &args.command {
        Command::Serve(serve) => validate_serve(serve),
        Command::Browse(browse) => validate_browse(browse),
        Command::CheckoutLink(checkout) => validate_checkout(&checkout.checkout),
        Command::Theme(theme) => match theme.set.as_deref() {
            Some(raw) if Theme::parse(raw).is_none() => {
                Err(format!("invalid --set '{raw}', expected light or dark"))
            }
            _ => Ok(()),
        },
        Command::InitConfig => Ok(()),
    }
}

fn validate_url(flag: &str, raw: &str) -> Result<(), String> {
    Url::parse(raw)
        .map(|_| ())
        .map_err(|e| format!("invalid {flag} '{raw}': {e}"))
}

fn validate_http(http: &HttpArgs) -> Result<(), String> {
    if http.timeout == Some(0) {
        return Err("invalid --timeout, expected positive integer".to_string());
    }
    if let Some(raw) = http.proxy_url.as_deref() {
        validate_url("--proxy-url", raw)?;
    }
    Ok(())
}

fn validate_serve(args: &ServeArgs) -> Result<(), String> {
    if args.port == Some(0) {
        return Err("invalid --port, expected 1-65535".to_string());
    }
    if let Some(raw) = args.api_base.as_deref() {
        validate_url("--api-base", raw)?;
    }
    if let Some(table) = args.table.as_deref() {
        if table.trim().is_empty() {
            return Err("invalid --table, expected a table name".to_string());
        }
    }
    validate_http(&args.http)
}

fn validate_browse(args: &BrowseArgs) -> Result<(), String> {
    if let Some(raw) = args.url.as_deref() {
        validate_url("--url", raw)?;
    }
    if let Some(raw) = args.format.as_deref() {
        if OutputFormat::parse(raw).is_none() {
            return Err(format!("invalid --format '{raw}', expected text, json or html"));
        }
    }
    validate_checkout(&args.checkout)?;
    validate_http(&args.http)
}

fn validate_checkout(args: &CheckoutConfigArgs) -> Result<(), String> {
    if let Some(raw) = args.return_url.as_deref() {
        validate_url("--return-url", raw)?;
    }
    Ok(())
}
