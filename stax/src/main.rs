//! stax - docs content server with markdown export

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use stax_core::{Config, Site, SlugPath};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Serve, list, and export docs pages
#[derive(Parser, Debug)]
#[command(name = "stax")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file (defaults to ./stax.toml, then the platform config dir)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Content directory, overriding the config file
    #[arg(long, global = true, value_name = "DIR")]
    content: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server
    Serve {
        /// Address to listen on
        #[arg(long, value_name = "ADDR")]
        bind: Option<String>,
    },
    /// Print every page path
    Routes,
    /// Print the markdown export of a page
    Export {
        /// Page path as `guide/setup` or `guide setup`; the root page when omitted
        slug: Vec<String>,
    },
    /// Write the markdown export and page view of every page
    Build {
        /// Output directory
        #[arg(long, value_name = "DIR")]
        out: PathBuf,
    },
    /// Copy the markdown export of a page to the clipboard
    #[cfg(feature = "clipboard")]
    Copy {
        /// Page path as `guide/setup` or `guide setup`; the root page when omitted
        slug: Vec<String>,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    // Load configuration
    let mut config =
        Config::load(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(dir) = args.content {
        config.content.dir = dir;
    }

    let site = Site::from_config(&config).with_context(|| {
        format!("Failed to load content from {}", config.content.dir.display())
    })?;

    match args.command {
        Command::Serve { bind } => {
            if let Some(bind) = bind {
                config.server.bind = bind;
            }
            let runtime = tokio::runtime::Runtime::new().context("Failed to start runtime")?;
            runtime.block_on(stax_server::serve(Arc::new(site), &config))?;
        }
        Command::Routes => {
            for route in site.list_all_routes() {
                println!("{}", SlugPath::from(route.slug));
            }
        }
        Command::Export { slug } => {
            let path = slug_arg(&slug);
            let markdown = site.raw_markdown(path.segments())?;
            print!("{}", markdown);
        }
        Command::Build { out } => build(&site, &out)?,
        #[cfg(feature = "clipboard")]
        Command::Copy { slug } => {
            let path = slug_arg(&slug);
            let markdown = site.raw_markdown(path.segments())?;
            copy(&markdown, std::time::Duration::from_millis(config.copy.reset_ms))?;
        }
    }

    Ok(())
}

fn slug_arg(slug: &[String]) -> SlugPath {
    SlugPath::from_url(&slug.join("/"))
}

/// Pre-materialize every route: `{slug}.md` and `{slug}.json` (`index.*` for the root)
fn build(site: &Site, out: &Path) -> Result<()> {
    let routes = site.list_all_routes();
    for route in &routes {
        let path = SlugPath::from(route.slug.clone());
        let stem = if path.is_root() {
            out.join("index")
        } else {
            path.segments().iter().fold(out.to_path_buf(), |acc, s| acc.join(s))
        };
        if let Some(parent) = stem.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let view = site.page(path.segments())?;
        let md_file = with_suffix(&stem, "md");
        fs::write(&md_file, view.markdown.as_bytes())
            .with_context(|| format!("Failed to write {}", md_file.display()))?;

        let json_file = with_suffix(&stem, "json");
        let json = serde_json::to_string_pretty(&view).context("Failed to serialize page view")?;
        fs::write(&json_file, json)
            .with_context(|| format!("Failed to write {}", json_file.display()))?;
    }

    log::info!("Wrote {} pages to {}", routes.len(), out.display());
    Ok(())
}

/// Append `.{ext}`; slugs may contain dots, so nothing is replaced
fn with_suffix(stem: &Path, ext: &str) -> PathBuf {
    let mut name = stem.as_os_str().to_owned();
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}

/// Copy, then hold the clipboard until the copied state resets
#[cfg(feature = "clipboard")]
fn copy(markdown: &str, reset_after: std::time::Duration) -> Result<()> {
    use stax_core::copy::{copy_to_clipboard, CopyButton};
    use std::time::Instant;

    let mut button = CopyButton::new(reset_after);
    let mut clipboard = None;
    button.copy(Instant::now(), || {
        clipboard = Some(copy_to_clipboard(markdown)?);
        Ok(())
    })?;
    eprintln!("{}", button.label());

    while !button.tick(Instant::now()) {
        if let Some(remaining) = button.remaining(Instant::now()) {
            std::thread::sleep(remaining);
        }
    }
    drop(clipboard);

    Ok(())
}
