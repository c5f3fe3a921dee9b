use anyhow::{bail, Context, Result};
use clap::{CommandFactory, Parser};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::info;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

mod display;

use wavestrip::cli::Args;
use wavestrip::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(shell) = args.completions {
        clap_complete::generate(shell, &mut Args::command(), "wavestrip", &mut std::io::stdout());
        return Ok(());
    }

    if args.init_config {
        init_logging(BoxMakeWriter::new(std::io::stderr), "wavestrip=warn", true)?;
        let path = Config::init_default_config()?;
        println!("Wrote default config to {}", path.display());
        return Ok(());
    }

    // The terminal UI owns the screen, so logs never go to stderr from here on
    let writer = match &args.log_file {
        Some(path) => BoxMakeWriter::new(Mutex::new(open_log_file(path)?)),
        None => default_log_writer(),
    };
    init_logging(writer, "wavestrip=info", false)?;

    // Load or create config
    let mut config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::load_from_default_path().unwrap_or_default(),
    };
    config.merge_args(&args);
    config.validate()?;

    let Some(file) = args.file.clone() else {
        bail!("No audio file given. Usage: wavestrip <FILE>");
    };

    info!("Starting Wavestrip with {}", file.display());
    display::terminal::run(config, file).await
}

fn init_logging(writer: BoxMakeWriter, directive: &str, ansi: bool) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(directive.parse()?))
        .with_writer(writer)
        .with_ansi(ansi)
        .init();
    Ok(())
}

/// `$XDG_STATE_HOME/wavestrip/wavestrip.log`
fn default_log_path() -> Option<PathBuf> {
    dirs::state_dir().map(|p| p.join("wavestrip").join("wavestrip.log"))
}

fn open_log_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory {}", parent.display()))?;
    }
    File::create(path).with_context(|| format!("Failed to create log file {}", path.display()))
}

/// Log file in the state directory, or nowhere when it cannot be opened.
fn default_log_writer() -> BoxMakeWriter {
    match default_log_path().map(|p| open_log_file(&p)) {
        Some(Ok(file)) => BoxMakeWriter::new(Mutex::new(file)),
        _ => BoxMakeWriter::new(std::io::sink),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_log_lives_under_wavestrip() {
        if let Some(path) = default_log_path() {
            assert!(path.ends_with("wavestrip/wavestrip.log"));
        }
    }

    #[test]
    fn log_file_parents_are_created() {
        let dir = std::env::temp_dir().join(format!("wavestrip-log-{}", std::process::id()));
        let path = dir.join("nested").join("run.log");

        open_log_file(&path).unwrap();
        assert!(path.exists());

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
