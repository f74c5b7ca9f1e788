use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use storefront_config::{ConfigLoad, ConfigLoader};
use storefront_model::{CategoryScope, SearchLocation, SearchQuery};
use storefront_search::domains::search::{
    Message, ResultsView, SearchSession, SessionDeps, SessionImageCache,
};
use storefront_search::infra::api_client::ApiClient;
use storefront_search::infra::navigation::MemoryHistory;
use storefront_search::infra::notifications::NoticeBoard;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// CLI entry point
#[derive(Parser, Debug)]
#[command(name = "storefront-search", version)]
#[command(about = "Search the storefront catalog by text or image")]
struct Cli {
    /// TOML configuration file (defaults to storefront.toml when present)
    #[arg(long, global = true, env = "STOREFRONT_CONFIG_PATH")]
    config: Option<PathBuf>,

    /// .env file to read before the process environment
    #[arg(long, global = true)]
    env_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Search products by text
    Search {
        text: String,
        #[arg(long)]
        category: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Search products with an image file
    Image {
        path: PathBuf,
        #[arg(long)]
        category: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Show autocomplete suggestions for partial text
    Suggest {
        text: String,
        #[arg(long)]
        category: Option<String>,
    },
    /// List catalog categories
    Categories,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "storefront_search=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut loader = ConfigLoader::new();
    if let Some(path) = &cli.config {
        loader = loader.with_config_file(path);
    }
    if let Some(path) = &cli.env_file {
        loader = loader.with_env_file(path);
    }

    let ConfigLoad { config, warnings } = match loader.load() {
        Ok(load) => load,
        Err(err) => {
            print_view(&ResultsView::misconfigured(&err));
            return Ok(ExitCode::from(2));
        }
    };
    for warning in &warnings {
        warn!(message = %warning, "configuration warning");
    }
    info!(source = ?config.metadata.source, "configuration loaded");

    let api = Arc::new(
        ApiClient::new(&config.api, config.search.request_timeout)
            .context("failed to build the catalog client")?,
    );
    let images = Arc::new(
        SessionImageCache::new(&config.images)
            .context("failed to open the session image cache")?,
    );
    let history = Arc::new(MemoryHistory::new(config.site.origin.clone()));
    let notices = Arc::new(NoticeBoard::new());

    let mut session = SearchSession::mount(
        SessionDeps {
            api,
            navigator: history.clone(),
            notifier: notices.clone(),
            images: images.clone(),
        },
        &config,
    );

    match cli.command {
        Command::Search {
            text,
            category,
            page,
        } => {
            let query = SearchQuery::text(text, CategoryScope::from_param(category.as_deref()))
                .with_page(page)
                .context("invalid page")?;
            session.navigate_to(SearchLocation::search(query, config.api.store_id.clone()));
            session.settle().await;
            print_view(&session.view());
        }
        Command::Image {
            path,
            category,
            page,
        } => {
            let bytes = tokio::fs::read(&path)
                .await
                .with_context(|| format!("failed to read {}", path.display()))?;
            // Store up front so the first search already carries the
            // category and page.
            let image = images
                .store(&bytes)
                .await
                .with_context(|| format!("{} is not a usable search image", path.display()))?;
            let query = SearchQuery::image(
                Some(image.id),
                CategoryScope::from_param(category.as_deref()),
            )
            .with_page(page)
            .context("invalid page")?;
            session.navigate_to(SearchLocation::search(query, config.api.store_id.clone()));
            session.settle().await;
            print_view(&session.view());
        }
        Command::Suggest { text, category } => {
            session.dispatch(Message::InputChanged(text));
            if let Some(category) = category {
                session.dispatch(Message::CategorySelected(CategoryScope::from_param(Some(
                    &category,
                ))));
            }
            session.settle().await;
            for suggestion in session.suggestions().items() {
                println!("{suggestion}");
            }
        }
        Command::Categories => {
            session.settle().await;
            for category in session.categories() {
                println!("{}\t{}", category.id, category.name);
            }
        }
    }

    for notice in notices.drain() {
        eprintln!("[{:?}] {}", notice.level, notice.message);
    }
    if let Some(url) = history.entries().last() {
        info!(location = %url, "final location");
    }
    session.dispose();

    Ok(ExitCode::SUCCESS)
}

fn print_view(view: &ResultsView) {
    match view {
        ResultsView::Idle => println!("Nothing to search for."),
        ResultsView::Loading { heading } => println!("{heading}: still loading"),
        ResultsView::Empty {
            query_text,
            heading,
            info,
        } => {
            println!("{heading}");
            if query_text.is_empty() {
                println!("No products found.");
            } else {
                println!("No products match \"{query_text}\".");
            }
            if let Some(info) = info {
                println!("{info}");
            }
        }
        ResultsView::Results {
            heading,
            items,
            total,
            pagination,
            info,
        } => {
            println!("{heading} ({total} products)");
            if let Some(info) = info {
                println!("{info}");
            }
            for item in items {
                println!("  {:<40} {:>14}  {}", item.name, item.price, item.href);
            }
            if pagination.is_visible() {
                let pages: Vec<String> = pagination
                    .window
                    .iter()
                    .map(|page| {
                        if *page == pagination.page {
                            format!("[{page}]")
                        } else {
                            page.to_string()
                        }
                    })
                    .collect();
                println!(
                    "Page {} of {}: {}",
                    pagination.page,
                    pagination.page_count,
                    pages.join(" ")
                );
            }
        }
        ResultsView::ReuploadRequired { message } | ResultsView::Misconfigured { message } => {
            println!("{message}")
        }
    }
}
