//! TreeScout: lazy filesystem tree browser.
//!
//! Thin binary entry point. All logic lives in the `treescout-core`
//! and `treescout-gui` crates.

#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use treescout_core::export::export_to_path;
use treescout_core::lister::FsLister;
use treescout_core::model::ListModel;
use treescout_core::tree::{CaseSensitivity, ExpandPolicy, SortOrder};
use treescout_core::{Browser, BrowserConfig};

/// Browse a directory tree that loads lazily as you expand it.
#[derive(Parser, Debug)]
#[command(name = "treescout", version, about)]
struct Cli {
    /// Directory to browse (defaults to the current directory)
    path: Option<PathBuf>,

    /// JSON config file; command-line flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Which directories expand without being asked
    #[arg(long, value_enum)]
    expand: Option<ExpandArg>,

    /// Sort descending instead of ascending
    #[arg(long)]
    descending: bool,

    /// Only show rows whose path contains this text
    #[arg(long)]
    filter: Option<String>,

    /// Match the filter without regard to case
    #[arg(long)]
    ignore_case: bool,

    /// Maximum directories enumerated at once
    #[arg(long)]
    max_active: Option<usize>,

    /// Print the tree to stdout instead of opening a window
    #[arg(long)]
    print: bool,

    /// Write the visible rows to a .csv or .json file and exit
    #[arg(long, value_name = "FILE")]
    export: Option<PathBuf>,

    /// Give up on headless runs after this many seconds
    #[arg(long, default_value_t = 300)]
    timeout: u64,

    /// Print the effective configuration as JSON and exit
    #[arg(long)]
    dump_config: bool,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ExpandArg {
    Manual,
    RootChildren,
    Recursive,
}

impl From<ExpandArg> for ExpandPolicy {
    fn from(arg: ExpandArg) -> Self {
        match arg {
            ExpandArg::Manual => ExpandPolicy::Manual,
            ExpandArg::RootChildren => ExpandPolicy::RootChildren,
            ExpandArg::Recursive => ExpandPolicy::Recursive,
        }
    }
}

impl Cli {
    fn browser_config(&self) -> anyhow::Result<BrowserConfig> {
        let mut config = match &self.config {
            Some(path) => BrowserConfig::load(path)?,
            None => BrowserConfig::default(),
        };
        if let Some(expand) = self.expand {
            config.expand = expand.into();
        }
        if self.descending {
            config.sort = SortOrder::Descending;
        }
        if let Some(filter) = &self.filter {
            config.filter = filter.clone();
        }
        if self.ignore_case {
            config.case = CaseSensitivity::Insensitive;
        }
        if let Some(max_active) = self.max_active {
            config.scan.max_active = max_active;
        }
        config.scan.validate()?;
        Ok(config)
    }

    fn root(&self) -> anyhow::Result<PathBuf> {
        match &self.path {
            Some(path) => Ok(path.clone()),
            None => std::env::current_dir().context("cannot read the current directory"),
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialise structured logging.
    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .with_writer(std::io::stderr)
        .init();

    let config = cli.browser_config()?;
    if cli.dump_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    let root = cli.root()?;
    if cli.print || cli.export.is_some() {
        return run_headless(&cli, root, config);
    }

    tracing::info!("TreeScout starting");

    // Start enumerating before the window opens so the first frame already
    // has rows to draw.
    let state = treescout_gui::AppState::new(root, config);

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_title("TreeScout")
            .with_inner_size([1100.0, 760.0])
            .with_min_inner_size([640.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "TreeScout",
        options,
        Box::new(|cc| Ok(Box::new(treescout_gui::TreeScoutApp::with_state(cc, state)))),
    )
    .map_err(|e| anyhow::anyhow!("eframe error: {e}"))?;

    Ok(())
}

/// Enumerate to completion without a window, then print and/or export.
fn run_headless(cli: &Cli, root: PathBuf, config: BrowserConfig) -> anyhow::Result<()> {
    let mut browser = Browser::open(&root, Arc::new(FsLister::new()), config)
        .with_context(|| format!("cannot browse {}", root.display()))?;

    if !browser.run_until_idle(Duration::from_secs(cli.timeout)) {
        tracing::warn!(
            "gave up after {}s: {}",
            cli.timeout,
            browser.summary()
        );
    }

    if cli.print {
        for row in browser.rows(0, browser.len()) {
            let marker = match (row.expandable, row.expanded) {
                (true, true) => "v ",
                (true, false) => "> ",
                _ => "  ",
            };
            println!(
                "{}{}{}",
                "  ".repeat(usize::from(row.depth)),
                marker,
                row.display_name()
            );
        }
        println!("{}", browser.summary());
    }

    if let Some(path) = &cli.export {
        let written = export_to_path(&browser, path)
            .with_context(|| format!("cannot export to {}", path.display()))?;
        eprintln!("exported {written} rows to {}", path.display());
    }

    Ok(())
}
