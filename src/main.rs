use std::path::PathBuf;

use clap::{
    CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};

use scdlcli::{cli, config, error};

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  author=env!("CARGO_PKG_AUTHORS"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Download tracks, sets, artist albums/tracks or likes
    Download(DownloadArgs),

    /// Scrape and cache a fresh web client id
    ClientId,

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Parser, Debug, Clone)]
pub struct DownloadArgs {
    /// SoundCloud URLs or .txt files with one URL per line
    #[clap(short, long = "urls", num_args = 1.., required = true)]
    pub urls: Vec<String>,

    /// 1: 64 Kbps OPUS, 2: 128 Kbps MP3, 3: 256 Kbps AAC, 4: best/original
    #[clap(short, long, value_parser = clap::value_parser!(u8).range(1..=4))]
    pub quality: Option<u8>,

    /// Output folder
    #[clap(short, long)]
    pub output_path: Option<PathBuf>,

    /// Track filename template, e.g. "{trackpadded}. {title}"
    #[clap(short, long)]
    pub template: Option<String>,

    /// Keep cover.jpg in the album folder
    #[clap(short, long)]
    pub keep_cover: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

#[tokio::main]
async fn main() {
    if let Err(e) = config::load_env().await {
        error!("Cannot load environment. Err: {}", e);
    }

    let cli = Cli::parse();

    match cli.command {
        Command::Download(opt) => {
            cli::download(cli::DownloadOptions {
                urls: opt.urls,
                quality: opt.quality,
                output_path: opt.output_path,
                template: opt.template,
                keep_cover: opt.keep_cover,
            })
            .await
        }
        Command::ClientId => cli::client_id().await,
        Command::Completions(opt) => {
            let mut cmd = Cli::command_for_update();
            let name = cmd.get_name().to_string();
            generate(opt.shell, &mut cmd, name, &mut std::io::stdout())
        }
    }
}
