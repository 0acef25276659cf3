//! Investments Loader - command line entry point

use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

use investments_loader::constants::APP_VERSION;
use investments_loader::settings::default_data_dir;
use investments_loader::{
    CategoryContentLoader, CategorySelector, ConfigError, HttpSource, LoadState, Settings,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, error, info};

const HELP: &str = "\
investments-loader - fetch and render investments by category

USAGE:
    investments-loader [OPTIONS] [CATEGORY]

OPTIONS:
    --category <ID>       Category to load (default: all)
    --base-url <URL>      Site origin, e.g. https://example.com
    --endpoint <PATH>     Listing endpoint path or absolute URL
    --csrf-token <TOKEN>  Value for the X-CSRF-TOKEN header
    --out <FILE>          Write rendered markup here instead of stdout
    --data-dir <DIR>      Settings and log directory
    --interactive         Read categories from stdin (`retry`, `all`, `quit`)
    --save-settings       Persist the effective settings and continue
    -h, --help            Print this help
";

/// Initialize file logging. Returns a guard that must be held for the process lifetime.
fn init_logging(data_dir: &Path) -> tracing_appender::non_blocking::WorkerGuard {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let logs_dir = data_dir.join("logs");
    std::fs::create_dir_all(&logs_dir).ok();

    let file_appender = tracing_appender::rolling::daily(&logs_dir, "investments-loader.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,investments_loader=debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(true)
                .with_line_number(true),
        )
        .init();

    guard
}

struct Args {
    help: bool,
    category: Option<String>,
    base_url: Option<String>,
    endpoint: Option<String>,
    csrf_token: Option<String>,
    out: Option<PathBuf>,
    data_dir: Option<PathBuf>,
    interactive: bool,
    save_settings: bool,
}

impl Args {
    fn parse() -> Result<Self, ConfigError> {
        let mut args = pico_args::Arguments::from_env();
        let mut parsed = Self {
            help: args.contains(["-h", "--help"]),
            category: args.opt_value_from_str("--category")?,
            base_url: args.opt_value_from_str("--base-url")?,
            endpoint: args.opt_value_from_str("--endpoint")?,
            csrf_token: args.opt_value_from_str("--csrf-token")?,
            out: args.opt_value_from_str("--out")?,
            data_dir: args.opt_value_from_str("--data-dir")?,
            interactive: args.contains("--interactive"),
            save_settings: args.contains("--save-settings"),
        };
        if parsed.category.is_none() {
            parsed.category = args
                .finish()
                .into_iter()
                .next()
                .and_then(|s| s.into_string().ok());
        }
        Ok(parsed)
    }

    /// Command-line values win over settings.json
    fn apply(&self, settings: &mut Settings) {
        if let Some(url) = &self.base_url {
            settings.base_url = url.clone();
        }
        if let Some(endpoint) = &self.endpoint {
            settings.endpoint = endpoint.clone();
        }
        if let Some(token) = &self.csrf_token {
            settings.csrf_token = Some(token.clone());
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = match Args::parse() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("error: {}\n\n{}", e, HELP);
            return ExitCode::from(2);
        }
    };
    if args.help {
        print!("{}", HELP);
        return ExitCode::SUCCESS;
    }

    let data_dir = args.data_dir.clone().unwrap_or_else(default_data_dir);
    std::fs::create_dir_all(&data_dir).ok();

    // Initialize logging - guard must live for entire process lifetime
    let _log_guard = init_logging(&data_dir);

    info!(version = APP_VERSION, "Investments loader starting");

    match run(args, &data_dir).await {
        Ok(code) => code,
        Err(e) => {
            error!(error = %e, "Investments loader failed");
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args, data_dir: &Path) -> Result<ExitCode, ConfigError> {
    let mut settings = Settings::load(data_dir);
    args.apply(&mut settings);
    if args.save_settings {
        settings.save(data_dir)?;
    }

    let source = HttpSource::from_settings(&settings)?;
    info!(url = %source.endpoint(), "Using investments endpoint");

    let mut loader = CategoryContentLoader::new(
        Arc::new(source),
        settings.retry_policy(),
        settings.render_options(),
    );
    let category = CategorySelector::parse(args.category.as_deref().unwrap_or_default());

    if args.interactive {
        interactive(&mut loader, category, args.out.as_deref()).await?;
        return Ok(ExitCode::SUCCESS);
    }

    loader.select_category(category);
    while !loader.state().is_settled() {
        let state = loader.step().await;
        report(state);
    }
    publish(&loader, args.out.as_deref()).await?;

    Ok(match loader.state() {
        LoadState::Error { .. } => ExitCode::FAILURE,
        _ => ExitCode::SUCCESS,
    })
}

enum Input {
    Event(Option<investments_loader::Event>),
    Line(std::io::Result<Option<String>>),
}

async fn interactive(
    loader: &mut CategoryContentLoader,
    initial: CategorySelector,
    out: Option<&Path>,
) -> Result<(), ConfigError> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loader.select_category(initial);
    report(loader.state());

    loop {
        let input = tokio::select! {
            event = loader.next_event() => Input::Event(event),
            line = lines.next_line() => Input::Line(line),
        };

        match input {
            Input::Event(Some(event)) => {
                if loader.handle(event) {
                    report(loader.state());
                    if loader.state().is_settled() {
                        publish(loader, out).await?;
                    }
                }
            }
            Input::Event(None) | Input::Line(Ok(None)) => break,
            Input::Line(Err(e)) => return Err(e.into()),
            Input::Line(Ok(Some(line))) => match line.trim() {
                "" => {}
                "quit" | "exit" => break,
                "retry" => {
                    if loader.retry() {
                        report(loader.state());
                    }
                }
                other => {
                    if loader.select_category(other) {
                        report(loader.state());
                    } else {
                        eprintln!("Already showing {}", other);
                    }
                }
            },
        }
    }

    debug!("Interactive session ended");
    Ok(())
}

fn report(state: &LoadState) {
    match state {
        LoadState::Idle => {}
        LoadState::Loading { attempt: 0, .. } => eprintln!("Loading investments..."),
        LoadState::Loading { .. } => {}
        LoadState::Retrying {
            attempt,
            max_attempts,
        } => eprintln!(
            "Connection issue. Retrying automatically... Attempt {} of {}",
            attempt, max_attempts
        ),
        LoadState::Success(items) if items.is_empty() => {
            eprintln!("No investments found. Type `all` to view all investments.")
        }
        LoadState::Success(items) => eprintln!("Loaded {} investments", items.len()),
        LoadState::Error { failure, .. } => {
            eprintln!("Unable to load investments ({}). Type `retry` to try again.", failure)
        }
    }
}

async fn publish(loader: &CategoryContentLoader, out: Option<&Path>) -> Result<(), ConfigError> {
    let html = loader.html();
    match out {
        Some(path) => {
            tokio::fs::write(path, html).await?;
            debug!(path = %path.display(), "Rendered markup written");
        }
        None => println!("{}", html),
    }
    Ok(())
}
