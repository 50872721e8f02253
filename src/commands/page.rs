use anyhow::{anyhow, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::{info, warn};

use reading_marker::anchor::structural_path;
use reading_marker::dom::html::ScrollRequest;
use reading_marker::dom::{Document, HtmlPage, PageView};
use reading_marker::render::TARGET_CLASS;
use reading_marker::session::{Command, PageEvent, Session};
use reading_marker::state::SessionConfig;
use reading_marker::store::types::MarkerKind;

pub async fn restore(mut session: Session<HtmlPage>) -> Result<()> {
    session.start().await;
    settle(&mut session).await;
    report(&session);
    Ok(())
}

pub async fn save(
    mut session: Session<HtmlPage>,
    manual: bool,
    at: Option<&str>,
    select: Option<&str>,
    scroll_y: f64,
) -> Result<()> {
    for selector in at.iter().chain(select.iter()) {
        if session.page().find_by_selector(selector).is_none() {
            return Err(anyhow!("No element matches `{}`", selector));
        }
    }

    let center = at.and_then(|sel| session.page().find_by_selector(sel));
    session.page_mut().set_viewport_center(center);
    session.page_mut().set_scroll_y(scroll_y);
    session
        .handle(PageEvent::Selected {
            anchor: select.map(str::to_string),
        })
        .await;

    let kind = if manual {
        MarkerKind::Manual
    } else {
        MarkerKind::Auto
    };
    session.save_marker(kind).await;
    report(&session);
    Ok(())
}

pub async fn jump(mut session: Session<HtmlPage>) -> Result<()> {
    session.dispatch(Command::JumpToLast).await;
    report(&session);
    Ok(())
}

pub async fn clear(mut session: Session<HtmlPage>) -> Result<()> {
    session.dispatch(Command::ClearMarkers).await;
    println!("Markers cleared for {}", session.url());
    Ok(())
}

/// Runs a live session over JSON lines read from stdin.
pub async fn watch(mut session: Session<HtmlPage>) -> Result<()> {
    session.start().await;

    let quiet = quiet_period(&SessionConfig::default());
    let (tx, rx) = mpsc::channel(64);
    let reader = async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    let Some(event) = PageEvent::parse(&line) else {
                        continue;
                    };
                    if tx.send(event).await.is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    warn!("Failed to read stdin: {}", e);
                    break;
                }
            }
        }
        // Let a pending capture or retry fire before closing the session.
        sleep(quiet).await;
        drop(tx);
    };

    info!(url = session.url(), "Watching page events on stdin");
    tokio::join!(session.run(rx), reader);
    report(&session);
    Ok(())
}

/// Gives the load retry its window on a one-shot command.
async fn settle(session: &mut Session<HtmlPage>) {
    let quiet = quiet_period(&SessionConfig::default());
    let (tx, rx) = mpsc::channel::<PageEvent>(1);
    let closer = async move {
        sleep(quiet).await;
        drop(tx);
    };
    tokio::join!(session.run(rx), closer);
}

fn quiet_period(config: &SessionConfig) -> std::time::Duration {
    config.autosave_debounce + config.load_retry_delay
}

fn report(session: &Session<HtmlPage>) {
    let page = session.page();
    match page.nodes_with_class(TARGET_CLASS).first() {
        Some(&node) => println!("Highlighted: {}", structural_path(page, node)),
        None => println!("Nothing highlighted"),
    }
    match page.last_scroll() {
        Some(ScrollRequest::Element { node, behavior }) => {
            println!("Scrolled ({:?}) to {}", behavior, structural_path(page, node))
        }
        Some(ScrollRequest::Offset { y, behavior }) => {
            println!("Scrolled ({:?}) to offset {}", behavior, y)
        }
        None => {}
    }
}
