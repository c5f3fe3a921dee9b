use clap::Parser;
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser, Debug, Default)]
#[command(name = "wavestrip")]
#[command(author, version, about = "Terminal audio player with a seekable waveform")]
pub struct Args {
    /// Audio file to play (mp3, wav, flac, ogg)
    pub file: Option<PathBuf>,

    /// Config file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Logical surface width in pixels
    #[arg(long)]
    pub width: Option<f64>,

    /// Logical surface height in pixels
    #[arg(long)]
    pub height: Option<f64>,

    /// Size the waveform to the terminal, one block per column
    #[arg(long)]
    pub fit: bool,

    /// Device pixel ratio of the backing store
    #[arg(long)]
    pub dpr: Option<f64>,

    /// Width of each waveform block in pixels
    #[arg(short, long)]
    pub block_width: Option<u32>,

    /// Color scheme: classic, ocean, fire, forest, mono
    #[arg(long)]
    pub colors: Option<String>,

    /// Stop at the end instead of looping
    #[arg(long)]
    pub no_loop: bool,

    /// Start playing as soon as the file is decoded
    #[arg(long)]
    pub autoplay: bool,

    /// PulseAudio sink to play through
    #[arg(short, long)]
    pub device: Option<String>,

    /// Log file [default: $XDG_STATE_HOME/wavestrip/wavestrip.log]
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Write a default config file and exit
    #[arg(long)]
    pub init_config: bool,

    /// Print shell completions and exit
    #[arg(long, value_name = "SHELL")]
    pub completions: Option<Shell>,
}
