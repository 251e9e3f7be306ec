use clap::{ArgAction, Args, Parser, Subcommand};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "vitrine",
    version,
    about = "product catalogue proxy and storefront",
    long_about = "Vitrine serves a product catalogue from a record store through a small proxy endpoint, and browses it from the command line.\n\nExamples:\n  vitrine serve --port 3000\n  vitrine browse --search laine --sort prix-asc\n  vitrine browse --format html --output vitrine.html\n  vitrine checkout-link --name \"Bonnet\" --price 15\n\nTip: Use --config to persist settings and keep CLI invocations short."
)]
pub struct CliArgs {
    #[arg(
        short = 'v',
        long = "verbose",
        action = ArgAction::Count,
        global = true,
        help_heading = "Output",
        help = "Increase verbosity (-v, -vv). RUST_LOG takes precedence."
    )]
    pub verbose: u8,

    #[arg(
        long = "no-color",
        global = true,
        help_heading = "Output",
        help = "Disable colored output."
    )]
    pub no_color: bool,

    #[arg(
        short = 'C',
        long = "config",
        visible_alias = "cfg",
        value_name = "FILE",
        global = true,
        help_heading = "Input",
        help = "Path to config file (defaults to ~/.vitrine/config.yml)."
    )]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the products proxy endpoint.
    Serve(ServeArgs),
    /// Load products from a proxy and print them.
    Browse(BrowseArgs),
    /// Print the payment link for a product.
    CheckoutLink(CheckoutArgs),
    /// Show or toggle the saved theme.
    Theme(ThemeArgs),
    /// Write the default config file if none exists.
    InitConfig,
}

#[derive(Args, Debug, Clone, Default)]
pub struct HttpArgs {
    #[arg(
        long = "timeout",
        value_name = "SECONDS",
        help_heading = "HTTP",
        help = "Outbound request timeout in seconds."
    )]
    pub timeout: Option<u64>,

    #[arg(
        short = 'p',
        long = "proxy-url",
        visible_alias = "proxy",
        value_name = "URL",
        help_heading = "HTTP",
        help = "Route outbound requests through this proxy."
    )]
    pub proxy_url: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ServeArgs {
    #[arg(
        short = 'b',
        long = "bind",
        value_name = "ADDR",
        help_heading = "Server",
        help = "Address to listen on."
    )]
    pub bind: Option<String>,

    #[arg(
        short = 'P',
        long = "port",
        value_name = "PORT",
        help_heading = "Server",
        help = "Port to listen on."
    )]
    pub port: Option<u16>,

    #[arg(
        long = "api-base",
        value_name = "URL",
        help_heading = "Record store",
        help = "Record store API base URL."
    )]
    pub api_base: Option<String>,

    #[arg(
        long = "table",
        value_name = "NAME",
        help_heading = "Record store",
        help = "Table holding the products."
    )]
    pub table: Option<String>,

    #[arg(
        long = "token-env",
        value_name = "VAR",
        help_heading = "Record store",
        help = "Environment variable holding the access token."
    )]
    pub token_env: Option<String>,

    #[arg(
        long = "base-id-env",
        value_name = "VAR",
        help_heading = "Record store",
        help = "Environment variable holding the base identifier."
    )]
    pub base_id_env: Option<String>,

    #[command(flatten)]
    pub http: HttpArgs,
}

#[derive(Args, Debug, Clone, Default)]
pub struct BrowseArgs {
    #[arg(
        short = 'u',
        long = "url",
        visible_alias = "products-url",
        value_name = "URL",
        help_heading = "Input",
        help = "Products endpoint to load from."
    )]
    pub url: Option<String>,

    #[arg(
        short = 's',
        long = "search",
        value_name = "TERM",
        help_heading = "Catalogue",
        help = "Filter by name or description."
    )]
    pub search: Option<String>,

    #[arg(
        long = "sort",
        value_name = "KEY",
        help_heading = "Catalogue",
        help = "Sort key: nom, nom-desc, prix-asc, prix-desc, ordre."
    )]
    pub sort: Option<String>,

    #[arg(
        short = 'i',
        long = "interactive",
        help_heading = "Catalogue",
        help = "Read search/sort commands from stdin after loading."
    )]
    pub interactive: bool,

    #[arg(
        short = 'o',
        long = "output",
        value_name = "FILE",
        help_heading = "Output",
        help = "Write the listing to a file instead of stdout."
    )]
    pub output: Option<String>,

    #[arg(
        short = 'F',
        long = "format",
        value_name = "FORMAT",
        help_heading = "Output",
        help = "Output format: text, json, html (inferred from --output)."
    )]
    pub format: Option<String>,

    #[command(flatten)]
    pub checkout: CheckoutConfigArgs,

    #[arg(
        long = "theme-file",
        value_name = "FILE",
        help_heading = "Output",
        help = "Theme preference file used for HTML output."
    )]
    pub theme_file: Option<String>,

    #[command(flatten)]
    pub http: HttpArgs,
}

#[derive(Args, Debug, Clone, Default)]
pub struct CheckoutConfigArgs {
    #[arg(
        long = "paypal-business",
        value_name = "EMAIL",
        help_heading = "Checkout",
        help = "Merchant account receiving payments."
    )]
    pub paypal_business: Option<String>,

    #[arg(
        long = "return-url",
        value_name = "URL",
        help_heading = "Checkout",
        help = "Page the buyer returns to after checkout."
    )]
    pub return_url: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct CheckoutArgs {
    #[arg(short = 'n', long = "name", value_name = "NAME", help = "Product name.")]
    pub name: String,

    #[arg(short = 'a', long = "price", value_name = "AMOUNT", help = "Price as displayed.")]
    pub price: String,

    #[command(flatten)]
    pub checkout: CheckoutConfigArgs,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ThemeArgs {
    #[arg(short = 't', long = "toggle", help = "Switch to the other theme and save it.")]
    pub toggle: bool,

    #[arg(
        long = "set",
        value_name = "THEME",
        conflicts_with = "toggle",
        help = "Save a theme explicitly: light or dark."
    )]
    pub set: Option<String>,

    #[arg(long = "theme-file", value_name = "FILE", help = "Theme preference file.")]
    pub theme_file: Option<String>,
}
