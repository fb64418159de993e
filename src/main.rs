use clap::{Parser, Subcommand};
use chrono::NaiveDate;
use quotecard::calendar::SystemClock;
use quotecard::config::{self, AppConfig, ArtKind};
use quotecard::daemon::Daemon;
use quotecard::imaging::{ImageBackend, QuoteCardRenderer, RustBackend};
use quotecard::pipeline::{Collaborators, ContentPipeline};
use quotecard::providers::{
    AnthropicQuotes, ArtSource, CuratedQuotes, FlatArt, ImagenArt, http_client,
};
use quotecard::queue::QueueScheduler;
use quotecard::review::Reviewer;
use quotecard::store::{ItemStore, JsonFileStore};
use quotecard::types::{ContentStatus, ItemFilter};
use quotecard::{logging, output, pacing};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup, called exactly once
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "quotecard")]
#[command(about = "Keeps a backlog of ready-to-publish quote cards")]
#[command(long_about = "\
Keeps a backlog of ready-to-publish quote cards

Each item is a quote (curated from a public quote API, or generated) laid
out over a generated background and stored as a JPEG, scheduled one per
day after the latest scheduled item. Items wait as 'pending' until a
reviewer approves or rejects them.

Lifecycle:

  pending ──approve──▶ approved ──publish──▶ published
     │  ▲                  │
   reject└──reopen──┐    reject
     ▼              │      ▼
  rejected ─────────┴── rejected

Secrets come from the environment (or a .env file):
  ANTHROPIC_API_KEY   enables generated quotes
  GEMINI_API_KEY      enables generated backgrounds (providers.art.kind = \"imagen\")

Run 'quotecard gen-config' to generate a documented quotecard.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Config file
    #[arg(long, default_value = config::DEFAULT_CONFIG_FILE, global = true)]
    config: PathBuf,

    /// Item store file (overrides [store] path)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show backlog counts against the target size
    Stats,
    /// Generate items until the backlog reaches its target size
    Fill,
    /// Generate a single item
    Generate {
        /// Use the synthetic quote source instead of a curated one
        #[arg(long)]
        synthetic: bool,
    },
    /// Delete rejected and published items older than the retention window
    Cleanup {
        /// Retention window in days (defaults to [queue] retention_days)
        #[arg(long)]
        days: Option<u32>,
    },
    /// List items in schedule order
    List {
        /// Only items with this status
        #[arg(long)]
        status: Option<ContentStatus>,
        /// Only pending/approved items scheduled within the next N days
        #[arg(long, value_name = "DAYS", conflicts_with = "status")]
        upcoming: Option<u32>,
    },
    /// Show one item in detail
    Show { id: Uuid },
    /// Write an item's image to a file
    Export { id: Uuid, path: PathBuf },
    /// Approve a pending item
    Approve { id: Uuid },
    /// Reject a pending or approved item
    Reject { id: Uuid },
    /// Move a rejected item back to pending
    Reopen { id: Uuid },
    /// Replace a rejected item with a freshly generated one
    Regenerate { id: Uuid },
    /// Delete an item (published items are kept)
    Delete { id: Uuid },
    /// Mark an approved item as published
    Publish {
        id: Uuid,
        /// Identifier returned by the publishing platform
        #[arg(long)]
        post_id: String,
    },
    /// Move a pending or approved item to another date
    Reschedule { id: Uuid, date: NaiveDate },
    /// Set an item's caption and hashtags
    Annotate {
        id: Uuid,
        #[arg(long)]
        caption: Option<String>,
        /// Repeat for several tags, without the leading '#'
        #[arg(long = "hashtag")]
        hashtags: Vec<String>,
    },
    /// Lay out a quote over a background without touching the store
    Render {
        #[arg(long)]
        quote: String,
        #[arg(long)]
        author: Option<String>,
        /// Background image (a flat canvas when omitted)
        #[arg(long)]
        background: Option<PathBuf>,
        #[arg(long)]
        output: PathBuf,
    },
    /// Run scheduled fill, cleanup and stats jobs until Ctrl-C
    Daemon {
        /// Fill the queue once on start
        #[arg(long)]
        fill_now: bool,
    },
    /// Print a stock quotecard.toml with all options documented
    GenConfig,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    if let Command::GenConfig = cli.command {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    let mut app_config = config::load_config(&cli.config)?;
    if let Some(store) = cli.store {
        app_config.store.path = store;
    }
    logging::init_logging(&app_config.logging)?;

    if let Command::Render {
        quote,
        author,
        background,
        output,
    } = &cli.command
    {
        return render(&app_config, quote, author.as_deref(), background.as_deref(), output);
    }

    let app = App::build(&app_config).await?;
    match cli.command {
        Command::Stats => output::print_stats(&app.queue.stats().await?),
        Command::Fill => output::print_fill_report(&app.queue.fill().await?),
        Command::Generate { synthetic } => {
            let item = app.queue.generate_single(synthetic).await?;
            output::print_item_detail(&item);
        }
        Command::Cleanup { days } => {
            let days = days.unwrap_or(app_config.queue.retention_days);
            let deleted = app.queue.cleanup(days).await?;
            for line in output::format_cleanup(deleted, days) {
                println!("{}", line);
            }
        }
        Command::List { status, upcoming } => {
            let items = match (upcoming, status) {
                (Some(days), _) => app.queue.upcoming(days).await?,
                (None, Some(status)) => app.store.list(&ItemFilter::with_statuses(&[status])).await?,
                (None, None) => app.store.list(&ItemFilter::any()).await?,
            };
            output::print_item_list(&items);
        }
        Command::Show { id } => output::print_item_detail(&app.reviewer.get(id).await?),
        Command::Export { id, path } => {
            let item = app.reviewer.get(id).await?;
            if item.image_payload.is_empty() {
                return Err(format!("Item {id} has no image").into());
            }
            std::fs::write(&path, &item.image_payload)?;
            println!("Wrote {} ({} bytes)", path.display(), item.image_payload.len());
        }
        Command::Approve { id } => output::print_item_detail(&app.reviewer.approve(id).await?),
        Command::Reject { id } => output::print_item_detail(&app.reviewer.reject(id).await?),
        Command::Reopen { id } => output::print_item_detail(&app.reviewer.reopen(id).await?),
        Command::Regenerate { id } => {
            output::print_item_detail(&app.reviewer.regenerate(id).await?)
        }
        Command::Delete { id } => {
            app.reviewer.delete(id).await?;
            println!("Deleted {id}");
        }
        Command::Publish { id, post_id } => {
            output::print_item_detail(&app.reviewer.mark_published(id, &post_id).await?)
        }
        Command::Reschedule { id, date } => {
            output::print_item_detail(&app.reviewer.reschedule(id, date).await?)
        }
        Command::Annotate {
            id,
            caption,
            hashtags,
        } => {
            let hashtags = (!hashtags.is_empty()).then_some(hashtags);
            output::print_item_detail(&app.reviewer.annotate(id, caption, hashtags).await?)
        }
        Command::Daemon { fill_now } => {
            let daemon = Daemon::new(app.queue.clone(), app_config.daemon.clone());
            daemon
                .run(fill_now, async {
                    let _ = tokio::signal::ctrl_c().await;
                })
                .await;
        }
        Command::Render { .. } | Command::GenConfig => {}
    }

    Ok(())
}

/// Everything the store-backed commands share.
struct App {
    store: Arc<dyn ItemStore>,
    queue: Arc<QueueScheduler>,
    reviewer: Reviewer,
}

impl App {
    async fn build(config: &AppConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let client = http_client(Duration::from_secs(config.providers.timeout_secs))?;
        let store: Arc<dyn ItemStore> = Arc::new(JsonFileStore::open(&config.store.path).await?);
        info!(path = %config.store.path.display(), "store opened");

        let art: Arc<dyn ArtSource> = match config.providers.art.kind {
            ArtKind::Imagen => Arc::new(ImagenArt::from_env(
                client.clone(),
                config.providers.art.clone(),
            )),
            ArtKind::Flat => Arc::new(FlatArt::new(config.layout.width, config.layout.height)),
        };

        let pipeline = ContentPipeline::new(Collaborators {
            store: store.clone(),
            curated: CuratedQuotes::from_config(client.clone(), &config.providers.curated),
            synthetic: Arc::new(AnthropicQuotes::from_env(
                client,
                config.providers.synthetic.clone(),
            )),
            art,
            renderer: renderer(config)?,
            clock: Arc::new(SystemClock),
        })
        .record_failures(config.pipeline.record_failures);
        let pipeline = Arc::new(pipeline);

        let queue = Arc::new(QueueScheduler::new(
            pipeline.clone(),
            pacing::from_config(&config.pacing),
            config.queue.clone(),
        ));
        Ok(Self {
            store,
            queue,
            reviewer: Reviewer::new(pipeline),
        })
    }
}

fn renderer(config: &AppConfig) -> Result<QuoteCardRenderer, Box<dyn std::error::Error>> {
    let backend: Arc<dyn ImageBackend> = match &config.layout.font_path {
        Some(path) => Arc::new(RustBackend::with_font_file(path)?),
        None => Arc::new(RustBackend::new()?),
    };
    Ok(QuoteCardRenderer::new(backend, config.layout.params()))
}

fn render(
    config: &AppConfig,
    quote: &str,
    author: Option<&str>,
    background: Option<&Path>,
    output: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let background = match background {
        Some(path) => std::fs::read(path)?,
        None => FlatArt::new(config.layout.width, config.layout.height).render_png()?,
    };
    let jpeg = renderer(config)?.render(&background, quote, author)?;
    std::fs::write(output, &jpeg)?;
    println!("Wrote {} ({} bytes)", output.display(), jpeg.len());
    Ok(())
}
