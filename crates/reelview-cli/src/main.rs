//! reelview - terminal movie browser for TMDB.

/// Application configuration (TOML).
mod config;

use std::fs::OpenOptions;
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use tracing::instrument;
use tracing_subscriber::filter::EnvFilter;
#[cfg(not(feature = "otel"))]
use tracing_subscriber::fmt;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
#[cfg(feature = "otel")]
use tracing_subscriber::layer::SubscriberExt;
#[cfg(feature = "otel")]
use tracing_subscriber::util::SubscriberInitExt;
use url::Url;

use crate::config::{AppConfig, TmdbConfig, resolve_config_path, resolve_log_path};
use reelview_api::tmdb::{TmdbApi, TmdbClient, TmdbError};
use reelview_tui::app::{self, AppSettings};
use reelview_tui::detail::{DetailTicket, DetailView, fetch_details};
use reelview_tui::format::{MovieCard, TrendingCard, rating_text, runtime_text, trailer_url, year_text};
use reelview_tui::pipeline::{MovieQuery, fetch_page};
use reelview_tui::trending::{TRENDING_LIMIT, fetch_trending};

/// CLI argument parser.
#[derive(Parser)]
#[command(about, version)]
struct Cli {
    /// Override config directory.
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Browse movies interactively (search, trending, details).
    Browse,
    /// Search movies by keyword; an empty query lists popular movies.
    Search(SearchArgs),
    /// Show this week's top trending movies.
    Trending,
    /// Show one movie with its trailer and top cast.
    Movie(MovieArgs),
    /// Show or initialize the config file.
    Config(ConfigCommand),
    /// Generate shell completions.
    Completions(CompletionsArgs),
}

/// Arguments for the `search` subcommand.
#[derive(clap::Args)]
struct SearchArgs {
    /// Search keyword.
    #[arg(long, default_value = "")]
    query: String,

    /// Maximum number of results (default: `[search] limit` from config).
    #[arg(long)]
    limit: Option<usize>,
}

/// Arguments for the `movie` subcommand.
#[derive(clap::Args)]
struct MovieArgs {
    /// TMDB movie ID.
    #[arg(long)]
    id: u64,
}

/// Arguments for the `config` subcommand.
#[derive(clap::Args)]
struct ConfigCommand {
    /// Config subcommand to run.
    #[command(subcommand)]
    command: ConfigSubcommands,
}

/// Available config subcommands.
#[derive(Subcommand)]
enum ConfigSubcommands {
    /// Print the effective configuration.
    Show,
    /// Write a config file with default values.
    Init(ConfigInitArgs),
}

/// Arguments for the `config init` subcommand.
#[derive(clap::Args)]
struct ConfigInitArgs {
    /// Overwrite an existing config file.
    #[arg(long)]
    force: bool,
}

/// Arguments for the `completions` subcommand.
#[derive(clap::Args)]
struct CompletionsArgs {
    /// Target shell.
    #[arg(value_enum)]
    shell: Shell,
}

/// Picks the API token: environment first, then the config file.
///
/// # Errors
///
/// Returns [`TmdbError::ConfigurationMissing`] if neither source has a non-blank token.
fn resolve_api_token(env_token: Option<String>, config: &TmdbConfig) -> Result<String> {
    env_token
        .into_iter()
        .chain(config.api_token.clone())
        .find(|t| !t.trim().is_empty())
        .ok_or_else(|| {
            TmdbError::ConfigurationMissing(String::from(
                "set the TMDB_API_TOKEN environment variable or `api_token` under [tmdb] in config.toml",
            ))
            .into()
        })
}

/// Parses a base URL override, making sure relative paths join below it.
///
/// # Errors
///
/// Returns an error if the URL is invalid.
fn parse_base_url(raw: &str) -> Result<Url> {
    let mut normalized = String::from(raw.trim());
    if !normalized.ends_with('/') {
        normalized.push('/');
    }
    Url::parse(&normalized).with_context(|| format!("invalid tmdb.base_url: {raw}"))
}

/// Builds a `TmdbClient` from `TMDB_API_TOKEN` or the `[tmdb]` config section.
///
/// # Errors
///
/// Returns an error if no token is configured or the client fails to build.
#[instrument(skip_all)]
fn build_tmdb_client(config: &TmdbConfig) -> Result<TmdbClient> {
    let api_token = resolve_api_token(std::env::var("TMDB_API_TOKEN").ok(), config)?;

    let mut builder = TmdbClient::builder()
        .api_token(api_token)
        .user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ))
        .timeout(Duration::from_secs(config.timeout_secs));
    if let Some(raw) = config.base_url.as_deref() {
        builder = builder.base_url(parse_base_url(raw)?);
    }
    builder.build().context("failed to build TMDB client")
}

/// Runs the `browse` subcommand.
///
/// # Errors
///
/// Returns an error if the TMDB client fails to build or the TUI fails.
#[instrument(skip_all)]
async fn run_browse(config: &AppConfig) -> Result<()> {
    let client = Arc::new(build_tmdb_client(&config.tmdb)?);
    let settings = AppSettings {
        search: config.search_pipeline(),
        suggestions: config.suggestions_pipeline(),
        language: config.tmdb.language.clone(),
    };
    tracing::info!("launching TUI");
    app::run(client, settings).await.context("movie browser TUI failed")
}

/// Runs the `search` subcommand.
///
/// # Errors
///
/// Returns an error if the TMDB client fails to build or the API request fails.
#[instrument(skip_all)]
async fn run_search(args: &SearchArgs, config: &AppConfig) -> Result<()> {
    let client = build_tmdb_client(&config.tmdb)?;
    let query = MovieQuery::for_query(&args.query);
    let limit = args.limit.unwrap_or(config.search.limit);

    let response = fetch_page(&client, &query, &config.tmdb.language)
        .await
        .context("TMDB movie request failed")?;

    match &query {
        MovieQuery::Discover => tracing::info!("Popular movies"),
        MovieQuery::Search(q) => tracing::info!("Results for \"{q}\""),
    }
    if response.results.is_empty() {
        tracing::info!("No movies found.");
        return Ok(());
    }

    tracing::info!("Total results: {}", response.total_results);
    tracing::info!("ID\tYear\tRating\tLang\tTitle");
    for card in response.results.iter().take(limit).map(MovieCard::from) {
        tracing::info!(
            "{}\t{}\t{}\t{}\t{}",
            card.id,
            card.year,
            card.rating,
            card.language,
            card.title,
        );
    }

    Ok(())
}

/// Runs the `trending` subcommand.
///
/// # Errors
///
/// Returns an error if the TMDB client fails to build or the API request fails.
#[instrument(skip_all)]
async fn run_trending(config: &AppConfig) -> Result<()> {
    let client = build_tmdb_client(&config.tmdb)?;

    let response = fetch_trending(&client, &config.tmdb.language)
        .await
        .context("TMDB trending request failed")?;

    tracing::info!("Trending this week");
    for (i, movie) in response.results.iter().take(TRENDING_LIMIT).enumerate() {
        let card = TrendingCard::new(i, movie);
        tracing::info!("#{}\t{}\t{}\t{}", card.rank, card.id, card.title, card.poster.src());
    }

    Ok(())
}

/// Runs the `movie` subcommand.
///
/// # Errors
///
/// Returns an error if the TMDB client fails to build or the API request fails.
#[instrument(skip_all, fields(movie_id = args.id))]
async fn run_movie(args: &MovieArgs, config: &AppConfig) -> Result<()> {
    let client = build_tmdb_client(&config.tmdb)?;
    let ticket = DetailTicket {
        generation: 0,
        movie_id: args.id,
    };

    let details = fetch_details(&client, ticket, &config.tmdb.language)
        .await
        .context("TMDB movie details request failed")?;
    let mut view = DetailView::from(details);

    if !view.poster.is_placeholder() {
        let loadable = client.probe_image(view.poster.src()).await.unwrap_or(false);
        if !loadable {
            view.poster.mark_broken();
        }
    }

    log_detail(&view);
    Ok(())
}

/// Writes a detail view to the log output.
fn log_detail(view: &DetailView) {
    let details = &view.details;
    tracing::info!("{} ({})", details.title, details.id);
    if let Some(tagline) = details.tagline.as_deref().filter(|t| !t.is_empty()) {
        tracing::info!("\"{tagline}\"");
    }
    tracing::info!(
        "Rating: {}  Year: {}  Runtime: {}",
        rating_text(details.vote_average),
        year_text(details.release_date.as_deref()),
        runtime_text(details.runtime),
    );
    if !details.genres.is_empty() {
        let genres: Vec<&str> = details.genres.iter().map(|g| g.name.as_str()).collect();
        tracing::info!("Genres: {}", genres.join(", "));
    }
    tracing::info!("Poster: {}", view.poster.src());
    if let Some(backdrop) = &view.backdrop {
        tracing::info!("Backdrop: {backdrop}");
    }
    if let Some(overview) = details.overview.as_deref().filter(|o| !o.is_empty()) {
        tracing::info!("Overview: {overview}");
    }

    if !view.cast.is_empty() {
        tracing::info!("Top cast:");
        for member in &view.cast {
            tracing::info!(
                "  {}\t{}\t{}",
                member.name,
                member.character,
                member.profile.src()
            );
        }
    }

    if let Some(trailer) = &view.trailer {
        tracing::info!("Trailer: {} {}", trailer.name, trailer_url(&trailer.key));
    }
}

/// Runs the `config show` subcommand.
///
/// # Errors
///
/// Returns an error if the config cannot be serialized.
#[instrument(skip_all)]
fn run_config_show(path: &Path, config: &AppConfig) -> Result<()> {
    let rendered =
        toml::to_string_pretty(&config.redacted()).context("failed to serialize config to TOML")?;

    let state = if path.exists() { "" } else { " (not found, using defaults)" };
    tracing::info!("# {}{state}", path.display());
    for line in rendered.lines() {
        tracing::info!("{line}");
    }
    Ok(())
}

/// Runs the `config init` subcommand.
///
/// # Errors
///
/// Returns an error if the file exists (without `--force`) or cannot be written.
#[instrument(skip_all)]
fn run_config_init(args: &ConfigInitArgs, path: &Path) -> Result<()> {
    if path.exists() && !args.force {
        bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }
    AppConfig::default().save(path)?;
    tracing::info!("Wrote default config to {}", path.display());
    Ok(())
}

/// Builds the log writer: a file while the TUI owns the terminal, stdout otherwise.
///
/// # Errors
///
/// Returns an error if the log file cannot be opened.
fn log_writer(command: &Commands, config_path: &Path) -> Result<(BoxMakeWriter, bool)> {
    if !matches!(command, Commands::Browse) {
        return Ok((BoxMakeWriter::new(io::stdout), io::stdout().is_terminal()));
    }

    let log_path = resolve_log_path(config_path);
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("failed to open log file {}", log_path.display()))?;
    Ok((BoxMakeWriter::new(Mutex::new(file)), false))
}

/// Installs the global tracing subscriber.
fn init_tracing(writer: BoxMakeWriter, ansi: bool) {
    #[cfg(not(feature = "otel"))]
    {
        fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with_target(false)
            .with_ansi(ansi)
            .with_writer(writer)
            .init();
    }

    #[cfg(feature = "otel")]
    {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_ansi(ansi)
            .with_writer(writer);

        let otel_layer = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
            .ok()
            .and_then(|_| {
                let exporter = opentelemetry_otlp::SpanExporter::builder()
                    .with_http()
                    .build()
                    .ok()?;

                let tracer_provider = opentelemetry_sdk::trace::SdkTracerProvider::builder()
                    .with_simple_exporter(exporter)
                    .build();

                let tracer = opentelemetry::trace::TracerProvider::tracer(
                    &tracer_provider,
                    env!("CARGO_PKG_NAME"),
                );
                opentelemetry::global::set_tracer_provider(tracer_provider);

                Some(tracing_opentelemetry::layer().with_tracer(tracer))
            });

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .with(otel_layer)
            .init();
    }
}

/// Entry point.
///
/// # Errors
///
/// Returns an error if subcommand execution fails.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Completions(args) = &cli.command {
        clap_complete::generate(
            args.shell,
            &mut Cli::command(),
            env!("CARGO_BIN_NAME"),
            &mut io::stdout(),
        );
        return Ok(());
    }

    let config_path = resolve_config_path(cli.dir.as_ref())?;
    let (writer, ansi) = log_writer(&cli.command, &config_path)?;
    init_tracing(writer, ansi);

    let config = AppConfig::load(&config_path)?;
    match &cli.command {
        Commands::Browse => run_browse(&config).await,
        Commands::Search(args) => run_search(args, &config).await,
        Commands::Trending => run_trending(&config).await,
        Commands::Movie(args) => run_movie(args, &config).await,
        Commands::Config(cmd) => match &cmd.command {
            ConfigSubcommands::Show => run_config_show(&config_path, &config),
            ConfigSubcommands::Init(args) => run_config_init(args, &config_path),
        },
        Commands::Completions(_) => Ok(()),
    }
}
