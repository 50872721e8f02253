use anyhow::{anyhow, Result};

use reading_marker::anchor::page_key;
use reading_marker::listing;
use reading_marker::store::types::MarkerKind;
use reading_marker::store::Backends;

/// Lists a page's markers the way the popup does.
pub async fn list(backends: &Backends, url: &str) -> Result<()> {
    let key = page_key(url).ok_or_else(|| anyhow!("Not a page URL: {}", url))?;
    let settings = backends.settings().await;
    let record = backends.markers(&settings).load(&key).await?;

    let entries = record.as_ref().map(listing::entries).unwrap_or_default();
    if entries.is_empty() {
        println!("No markers for {}", key);
        return Ok(());
    }

    println!("Markers for {}\n", key);
    for entry in &entries {
        println!("{}", entry);
    }
    Ok(())
}

pub async fn pages(backends: &Backends) -> Result<()> {
    let settings = backends.settings().await;
    let store = backends.markers(&settings);
    let keys = store.page_keys().await?;

    if keys.is_empty() {
        println!("No pages with markers yet. Use `lrf save` to add one.");
        return Ok(());
    }

    for key in &keys {
        let Some(record) = store.load(key).await? else {
            continue;
        };
        println!(
            "{} ({} manual, {} auto) updated {}",
            key,
            record.count(MarkerKind::Manual),
            record.count(MarkerKind::Auto),
            listing::format_time(record.last_updated)
        );
    }
    Ok(())
}
