use clap::Parser;
use media_dl::{Config, DownloadService};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

/// Web front end for yt-dlp downloads
#[derive(Parser, Debug)]
#[command(name = "media-dl", version, about)]
struct Args {
    /// JSON configuration file (defaults apply when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on, e.g. 0.0.0.0:5000
    #[arg(short, long)]
    bind: Option<SocketAddr>,

    /// Directory holding per-job output directories
    #[arg(short, long)]
    download_dir: Option<PathBuf>,

    /// Shared API token
    #[arg(long, env = "WEB_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Explicit path to the yt-dlp executable
    #[arg(long)]
    ytdlp_path: Option<PathBuf>,
}

impl Args {
    fn into_config(self) -> media_dl::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };

        if let Some(bind) = self.bind {
            config.api.bind_address = bind;
        }
        if let Some(dir) = self.download_dir {
            config.download.download_dir = dir;
        }
        if let Some(token) = self.token {
            config.api.token = token;
        }
        if let Some(path) = self.ytdlp_path {
            config.tools.ytdlp_path = Some(path);
        }

        config.validate()?;
        Ok(config)
    }
}

async fn run(args: Args) -> media_dl::Result<()> {
    let config = args.into_config()?;
    let service = Arc::new(DownloadService::new(config).await?);

    media_dl::api::serve_with_shutdown(
        service.clone(),
        service.get_config(),
        media_dl::wait_for_signal(),
    )
    .await?;

    service.shutdown().await
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(e) = media_dl::logging::init_logging() {
        eprintln!("{e}");
        return ExitCode::FAILURE;
    }

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "media-dl exited with error");
            ExitCode::FAILURE
        }
    }
}
