use std::path::Path;

use anyhow::Context as _;

use swatchlog::history::config::{self, HistoryConfig};
use swatchlog::render::HexRenderer;
use swatchlog::{HistoryService, SaveOutcome, ThemeRecord};

fn load_config() -> HistoryConfig {
    let cwd = std::env::current_dir().unwrap_or_default();
    HistoryConfig::load(Some(&config::project_root_for(&cwd)))
}

fn open_service() -> anyhow::Result<HistoryService> {
    let path = config::db_path().context("cannot determine history DB path")?;
    HistoryService::open(&path, &load_config())
        .with_context(|| format!("open history at {}", path.display()))
}

fn report(result: anyhow::Result<()>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("[swatchlog] error: {e:#}");
            1
        }
    }
}

fn list() -> anyhow::Result<()> {
    let history = open_service()?;
    if history.list_ids().is_empty() {
        eprintln!("[swatchlog] no history entries found");
        return Ok(());
    }
    for (position, entry) in history.entries().enumerate() {
        println!(
            "{position} {} {}",
            entry.created_at.format("%Y-%m-%d %H:%M:%S"),
            entry.request_id
        );
    }
    Ok(())
}

pub fn cmd_list() -> i32 {
    report(list())
}

fn show(request_id: &str, raw: bool) -> anyhow::Result<()> {
    let history = open_service()?;
    if raw {
        for slots in history.store().raw_slots(request_id)? {
            let cols: Vec<&str> = slots
                .iter()
                .map(|s| s.as_deref().unwrap_or("NULL"))
                .collect();
            println!("{}", cols.join(" | "));
        }
        return Ok(());
    }
    for theme in history.load_rendered(request_id, &HexRenderer)? {
        let record = &theme.record;
        println!(
            "{} by {} ({}, rated {})",
            record.title, record.author, record.edited_at, record.rating
        );
        println!("  {}", theme.full_image);
    }
    Ok(())
}

pub fn cmd_show(request_id: &str, raw: bool) -> i32 {
    report(show(request_id, raw))
}

fn save(request_id: &str, file: &Path) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let records: Vec<ThemeRecord> = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse themes from {}", file.display()))?;
    let mut history = open_service()?;
    match history.save(request_id, &records)? {
        SaveOutcome::Disabled => eprintln!("[swatchlog] history disabled, nothing saved"),
        SaveOutcome::Inserted => {
            eprintln!("[swatchlog] saved {request_id} ({} themes)", records.len());
        }
        SaveOutcome::Evicted(old) => {
            eprintln!(
                "[swatchlog] saved {request_id} ({} themes), evicted {old}",
                records.len()
            );
        }
    }
    Ok(())
}

pub fn cmd_save(request_id: &str, file: &Path) -> i32 {
    report(save(request_id, file))
}

pub fn cmd_config() -> i32 {
    let cfg = load_config();
    println!("capacity = {}", cfg.capacity);
    println!("enabled = {}", cfg.enabled);
    match config::db_path() {
        Some(p) => println!("db_path = {}", p.display()),
        None => println!("db_path = (unknown)"),
    }
    0
}
