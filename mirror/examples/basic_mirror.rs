//! Basic mirror example demonstrating the mirror engine library

use std::error::Error;
use std::fs;

use mirror::{SyncEngine, SyncOptions};

fn main() -> Result<(), Box<dyn Error>> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    println!("Basic Mirror Engine Example");
    println!("===========================");

    // Create temporary directories for testing
    let temp_dir = tempfile::TempDir::new()?;
    let docs_dir = temp_dir.path().join("docs");
    let assets_dir = temp_dir.path().join("assets");
    let dest_dir = temp_dir.path().join("site");

    // Two sources that together make up the target
    fs::create_dir_all(docs_dir.join("guide"))?;
    fs::write(docs_dir.join("index.md"), b"# Welcome")?;
    fs::write(docs_dir.join("guide").join("install.md"), b"Run the installer")?;

    fs::create_dir_all(assets_dir.join("img"))?;
    fs::write(assets_dir.join("img").join("logo.svg"), b"<svg/>")?;

    // Something the sources do not have
    fs::create_dir_all(&dest_dir)?;
    fs::write(dest_dir.join("stale.html"), b"<html/>")?;

    println!("Sources: {}, {}", docs_dir.display(), assets_dir.display());
    println!("Destination: {}", dest_dir.display());
    println!();

    let sources = vec![&docs_dir, &assets_dir];
    let engine = SyncEngine::new(SyncOptions::default());

    // Show what would happen first
    let plan = engine.preview(&sources, &dest_dir)?;
    println!("Planned actions:");
    for action in &plan.actions {
        println!("  {:<16} {}", action.name(), action.path());
    }
    println!();

    let metrics = engine.sync(&sources, &dest_dir)?;
    println!("First run:  {}", metrics.summary());

    // Running again changes nothing
    let metrics = engine.sync(&sources, &dest_dir)?;
    println!("Second run: {}", metrics.summary());

    // Edit one file and mirror the change
    fs::write(docs_dir.join("index.md"), b"# Welcome back")?;
    let metrics = engine.sync(&sources, &dest_dir)?;
    println!("Third run:  {}", metrics.summary());

    // Both sources claiming the same file is rejected
    fs::write(assets_dir.join("index.md"), b"# Duplicate")?;
    match engine.sync(&sources, &dest_dir) {
        Ok(_) => println!("Unexpected success"),
        Err(e) => println!("Conflict:   {}", e),
    }

    println!();
    println!("Metrics JSON:");
    println!("{}", metrics.to_json()?);

    Ok(())
}
