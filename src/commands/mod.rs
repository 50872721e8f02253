mod page;
mod records;
mod settings;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use reading_marker::dom::HtmlPage;
use reading_marker::session::Session;
use reading_marker::source::{is_remote, load_page_source};
use reading_marker::state::SessionConfig;
use reading_marker::store::backend::CnidariumStore;
use reading_marker::store::Backends;

/// lrf - resume reading where you left off
#[derive(Parser, Debug)]
#[command(name = "lrf", about = "Reading position markers for web pages")]
pub struct Cli {
    /// HTML source: a local file or an http(s) URL
    #[arg(long, global = true)]
    pub page: Option<String>,

    /// Page URL that identifies the page (defaults to --page when it is a URL)
    #[arg(long, global = true)]
    pub url: Option<String>,

    /// Root directory of the persistent sync and local areas
    #[arg(long, env = "LRF_DATA_DIR", default_value = "./data/markers", global = true)]
    pub data_dir: PathBuf,

    /// Keep everything in memory for this run
    #[arg(long, global = true)]
    pub memory: bool,

    #[command(subcommand)]
    pub command: Cmd,
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Restore the best marker the way a page load does
    Restore,
    /// Capture a marker at the given position
    Save {
        /// Save a manual marker instead of an auto one
        #[arg(long)]
        manual: bool,
        /// Selector of the element at the viewport center
        #[arg(long)]
        at: Option<String>,
        /// Selector of the element holding the text selection
        #[arg(long)]
        select: Option<String>,
        /// Current vertical scroll offset
        #[arg(long, default_value_t = 0.0)]
        scroll_y: f64,
    },
    /// Scroll to the best marker
    Jump,
    /// Delete every marker for the page
    Clear,
    /// Show the page's markers, newest first
    List,
    /// Show every page with stored markers
    Pages,
    /// Show or change settings
    Settings {
        #[arg(long)]
        use_sync: Option<bool>,
        #[arg(long)]
        auto_save: Option<bool>,
        #[arg(long)]
        auto_scroll_on_load: Option<bool>,
    },
    /// Feed JSON page events from stdin into a live session
    Watch,
}

pub async fn run(cli: Cli) -> Result<()> {
    let backends = open_backends(&cli).await?;

    match &cli.command {
        Cmd::Restore => page::restore(open_session(&cli, backends).await?).await,
        Cmd::Save {
            manual,
            at,
            select,
            scroll_y,
        } => {
            let session = open_session(&cli, backends).await?;
            page::save(session, *manual, at.as_deref(), select.as_deref(), *scroll_y).await
        }
        Cmd::Jump => page::jump(open_session(&cli, backends).await?).await,
        Cmd::Clear => page::clear(open_session(&cli, backends).await?).await,
        Cmd::Watch => page::watch(open_session(&cli, backends).await?).await,
        Cmd::List => records::list(&backends, &page_url(&cli)?).await,
        Cmd::Pages => records::pages(&backends).await,
        Cmd::Settings {
            use_sync,
            auto_save,
            auto_scroll_on_load,
        } => settings::settings(&backends, *use_sync, *auto_save, *auto_scroll_on_load).await,
    }
}

async fn open_backends(cli: &Cli) -> Result<Backends> {
    if cli.memory {
        return Ok(Backends::in_memory());
    }
    let sync = CnidariumStore::open(&cli.data_dir.join("sync")).await?;
    let local = CnidariumStore::open(&cli.data_dir.join("local")).await?;
    info!("Marker storage initialized at {:?}", cli.data_dir);
    Ok(Backends::new(Arc::new(sync), Arc::new(local)))
}

fn page_url(cli: &Cli) -> Result<String> {
    if let Some(url) = &cli.url {
        return Ok(url.clone());
    }
    match &cli.page {
        Some(page) if is_remote(page) => Ok(page.clone()),
        _ => Err(anyhow!("--url is required unless --page is an http(s) URL")),
    }
}

async fn open_session(cli: &Cli, backends: Backends) -> Result<Session<HtmlPage>> {
    let source = cli
        .page
        .as_deref()
        .ok_or_else(|| anyhow!("--page is required for this command"))?;
    let url = page_url(cli)?;
    let html = load_page_source(source).await?;
    Ok(Session::new(
        HtmlPage::parse(&html),
        url,
        backends,
        SessionConfig::default(),
    ))
}
