use clap::Parser;
use colored::Colorize;
use dataview_adapter::client::HttpBackend;
use dataview_adapter::config::Settings;
use dataview_adapter::controller::PageController;
use dataview_adapter::datasource::OrderRequest;
use dataview_adapter::errors::Error;
use dataview_adapter::query::Direction;
use dataview_adapter::rules::RuleGroup;
use dataview_adapter::widgets::terminal::{LoadingLine, StaticRuleBuilder, TerminalTable};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

/// Browse a backend table one page at a time, optionally filtered by a
/// rule tree.
#[derive(Parser, Debug)]
#[command(name = "dataview", version)]
struct Args {
    #[arg(long)]
    schema: String,

    #[arg(long)]
    table: String,

    /// Backend root, e.g. http://127.0.0.1:8000
    #[arg(long)]
    base_url: Option<String>,

    /// Cookie header sent with every request; the CSRF token is read from it.
    #[arg(long)]
    cookie: Option<String>,

    #[arg(long)]
    csrf_token: Option<String>,

    /// JSON rule tree in the rule-builder format.
    #[arg(long, value_name = "FILE")]
    rules: Option<PathBuf>,

    #[arg(long, default_value_t = 0)]
    start: u64,

    /// Page size; -1 fetches every row.
    #[arg(long, default_value_t = 10, allow_negative_numbers = true)]
    length: i64,

    /// Sort as COLUMN_INDEX:asc|desc; repeatable.
    #[arg(long = "order", value_parser = parse_order)]
    order: Vec<OrderRequest>,

    /// Print the derived filter definitions before the page.
    #[arg(long)]
    show_filters: bool,
}

fn parse_order(raw: &str) -> Result<OrderRequest, String> {
    let (index, dir) = raw.split_once(':').unwrap_or((raw, "asc"));
    let column = index
        .parse::<usize>()
        .map_err(|_| format!("'{}' is not a column index", index))?;
    let dir = match dir.to_lowercase().as_str() {
        "asc" => Direction::Asc,
        "desc" => Direction::Desc,
        other => return Err(format!("'{}' is not asc or desc", other)),
    };
    Ok(OrderRequest { column, dir })
}

fn read_rules(path: &Path) -> Result<RuleGroup, Error> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
    serde_json::from_str(&text)
        .map_err(|e| Error::Config(format!("invalid rule tree in {}: {}", path.display(), e)))
}

async fn run(args: Args) -> Result<(), Error> {
    let mut settings = Settings::from_env();
    if let Some(base_url) = args.base_url {
        settings.base_url = base_url;
    }
    if let Some(cookie) = args.cookie {
        settings.cookie = Some(cookie);
    }
    let csrf_token = match args.csrf_token {
        Some(token) => token,
        None => settings.csrf_token()?,
    };
    let rules = args.rules.as_deref().map(read_rules).transpose()?;

    let backend = Arc::new(HttpBackend::new(&settings, csrf_token)?);
    let mut controller = PageController::new(
        backend,
        Arc::new(LoadingLine::default()),
        TerminalTable::new(args.length, args.order),
        StaticRuleBuilder::new(rules),
    );

    controller.load_table(&args.schema, &args.table).await?;

    if args.show_filters {
        for filter in controller.builder.filters() {
            println!("{} {}", filter.id.bold(), filter.filter_type.as_str().cyan());
        }
        println!();
    }

    let filtered = controller.apply_filters().await?;
    if !filtered || args.start > 0 {
        controller.table.page(args.start).await?;
    }
    print!("{}", controller.table.render());
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let ansi = std::io::stderr().is_terminal() && std::env::var_os("NO_COLOR").is_none();
    tracing_subscriber::fmt()
        .with_ansi(ansi)
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,hyper=warn,reqwest=warn".into()),
        )
        .init();

    match run(Args::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", err.to_string().red());
            ExitCode::FAILURE
        }
    }
}
