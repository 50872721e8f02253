use anyhow::Result;

use reading_marker::store::Backends;

/// Shows settings, or updates the ones given.
pub async fn settings(
    backends: &Backends,
    use_sync: Option<bool>,
    auto_save: Option<bool>,
    auto_scroll_on_load: Option<bool>,
) -> Result<()> {
    let mut settings = backends.settings().await;

    if use_sync.is_some() || auto_save.is_some() || auto_scroll_on_load.is_some() {
        if let Some(value) = use_sync {
            settings.use_sync = value;
        }
        if let Some(value) = auto_save {
            settings.auto_save = value;
        }
        if let Some(value) = auto_scroll_on_load {
            settings.auto_scroll_on_load = value;
        }
        settings.save(backends.sync()).await?;
        println!("Settings saved.");
    }

    println!(
        "useSync: {}\nautoSave: {}\nautoScrollOnLoad: {}",
        settings.use_sync, settings.auto_save, settings.auto_scroll_on_load
    );
    Ok(())
}
