use anyhow::Result;
use clap::Parser;
use cli::{Cli, Mode};
use newslinks_common::observability::{LogConfig, init_logging};
use newslinks_config::{NewslinksConfig, NewslinksConfigLoader};
use newslinks_runtime::SearchRuntime;
use std::time::Duration;
mod cli;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1) Load config (env wins)
    let loader = match &cli.config {
        Some(path) => NewslinksConfigLoader::new().with_file(path),
        None => NewslinksConfigLoader::new().with_default_files(),
    };
    let mut cfg = loader.load()?;

    match cli.mode() {
        Mode::Tui => {
            // the TUI owns the terminal; logs go to the file only
            init_logging(log_config(&cfg, false))?;
            let runtime = SearchRuntime::build("newslinks-tui", None)?;
            let result = runtime.block_on(newslinks_tui::run_tui(&cfg, runtime.handle()));
            runtime.shutdown(Duration::from_millis(500));
            result
        }
        Mode::Search {
            query,
            limit,
            pages,
            debug,
        } => {
            init_logging(log_config(&cfg, cfg.logging.stderr))?;
            if let Some(pages) = pages {
                cfg.search.max_pages = pages;
            }
            run_once(&cfg, &query.join(" "), limit, debug)
        }
    }
}

fn log_config(cfg: &NewslinksConfig, emit_stderr: bool) -> LogConfig {
    LogConfig {
        log_dir: cfg.logging.dir.clone(),
        emit_stderr,
        format: cfg.logging.format,
        default_filter: cfg.logging.filter.clone(),
        ..LogConfig::default()
    }
}

fn run_once(cfg: &NewslinksConfig, query: &str, limit: Option<u32>, debug: bool) -> Result<()> {
    let limit = limit.unwrap_or(cfg.search.default_limit);
    tracing::info!(%query, limit, max_pages = cfg.search.max_pages, "one-shot search");

    match newslinks_web::run_search_blocking(cfg, query, limit) {
        Ok(outcome) => {
            if outcome.urls.is_empty() {
                println!("No links found.");
            }
            for (i, url) in outcome.urls.iter().enumerate() {
                println!("{:02}. {url}", i + 1);
            }
            if debug {
                println!();
                for line in outcome.debug.lines() {
                    println!("# {line}");
                }
            }
            Ok(())
        }
        Err(failure) => {
            if debug {
                for line in failure.debug.lines() {
                    eprintln!("# {line}");
                }
            }
            Err(anyhow::anyhow!("Search failed: {}", failure.error))
        }
    }
}
