use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use folio_config::Config;
use folio_engine::changelog::EditTarget;
use folio_engine::markdown;
use folio_engine::{
    ArticleDef, ArticleEvent, ArticleInstance, BlockRegistry, FileStore, InMemoryRemote,
    PendingStore, RemoteStore,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "folio")]
#[command(about = "Block-structured articles from markdown")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write a config file, keeping readable existing settings
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },
    /// Print the canonical markdown of a file
    Fmt { file: PathBuf },
    /// Print the block records parsed from a file as JSON
    Parse { file: PathBuf },
    /// Print the pending actions left in the durable store
    Pending,
    /// Append a markdown file to an article and print the flushed article
    Apply {
        /// Article definition as JSON
        article: PathBuf,
        file: PathBuf,
        /// Flush right away instead of waiting for the quiescence delay
        #[arg(long)]
        no_wait: bool,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    match args.command {
        Command::Init { force } => init(force),
        Command::Fmt { file } => fmt(&file),
        Command::Parse { file } => parse(&file),
        Command::Pending => pending(&load_config()?),
        Command::Apply {
            article,
            file,
            no_wait,
        } => apply(&load_config()?, &article, &file, no_wait).await,
    }
}

fn load_config() -> Result<Config> {
    let config = Config::load_or_default().with_context(|| {
        format!(
            "Failed to load config file at {}",
            Config::config_path().display()
        )
    })?;
    log::debug!("Using config {config:?}");
    Ok(config)
}

fn init(force: bool) -> Result<()> {
    let config_path = Config::config_path();
    if config_path.exists() && !force {
        anyhow::bail!(
            "Config file already exists at {} (use --force to overwrite)",
            config_path.display()
        );
    }
    let config = Config::load().ok().flatten().unwrap_or_default();
    config
        .save()
        .with_context(|| format!("Failed to write config file at {}", config_path.display()))?;
    log::info!("Wrote config to {}", config_path.display());
    Ok(())
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn fmt(file: &Path) -> Result<()> {
    let registry = BlockRegistry::with_builtin();
    if let Some(canonical) = markdown::canonicalize(&registry, &read(file)?) {
        println!("{canonical}");
    }
    Ok(())
}

fn parse(file: &Path) -> Result<()> {
    let parsed = markdown::parse(&read(file)?);
    println!("{}", serde_json::to_string_pretty(&parsed)?);
    Ok(())
}

fn store(config: &Config) -> FileStore {
    FileStore::new(&config.storage_dir, &config.storage_key)
}

fn pending(config: &Config) -> Result<()> {
    let store = store(config);
    let actions = store
        .load()
        .with_context(|| format!("Failed to read {}", store.path().display()))?;
    println!("{}", serde_json::to_string_pretty(&actions)?);
    Ok(())
}

async fn apply(config: &Config, article: &Path, file: &Path, no_wait: bool) -> Result<()> {
    let def: ArticleDef = serde_json::from_str(&read(article)?)
        .with_context(|| format!("Invalid article definition in {}", article.display()))?;
    let article_id = def.id;
    let remote = InMemoryRemote::new().with_article(def);
    let loaded = remote.export_article(article_id).await?;

    let mut instance = ArticleInstance::new(
        loaded,
        Arc::new(BlockRegistry::with_builtin()),
        Arc::new(store(config)),
    )
    .with_flush_delay(config.flush_delay());
    instance.subscribe(|event| match event {
        ArticleEvent::Changed => log::debug!("Article changed"),
        ArticleEvent::Flushed(report) => log::info!("Flushed: {report:?}"),
        ArticleEvent::FlushFailed(message) => log::error!("Flush failed: {message}"),
    });

    if !instance.unapplied().is_empty() {
        log::warn!(
            "{} stored action(s) no longer apply and are kept aside",
            instance.unapplied().len()
        );
    }

    let outcome = instance.commit_text_edit(&EditTarget::Input, &read(file)?)?;
    log::info!("Inserted {} block(s)", outcome.inserted.len());

    if no_wait {
        instance.flush(&remote).await?;
    } else {
        if let Some(remaining) = instance.timer().remaining(Instant::now()) {
            log::info!("Waiting {remaining:?} for quiescence");
            tokio::time::sleep(remaining).await;
        }
        instance.flush_if_due(Instant::now(), &remote).await?;
    }

    let exported = remote.export_article(article_id).await?;
    println!("{}", serde_json::to_string_pretty(&exported)?);
    Ok(())
}
