use std::path::PathBuf;

use crate::{
    Error, Res,
    cli::{MediaKind, collections},
    config::{self, Settings},
    error, info,
    management::{ClientIdManager, CookieJar, ScratchDir},
    media::{
        AcquisitionOptions, AcquisitionOrchestrator, ContainerTagger, Entitlement,
        FfmpegRemuxer, QualityTier, Remuxer, Tagger,
    },
    soundcloud::{Client, ClientOptions},
    success, utils, warning,
};

/// Flags of `scdlcli download`; each overrides the matching setting.
#[derive(Debug, Clone, Default)]
pub struct DownloadOptions {
    pub urls: Vec<String>,
    pub quality: Option<u8>,
    pub output_path: Option<PathBuf>,
    pub template: Option<String>,
    pub keep_cover: bool,
}

/// Everything a URL handler needs, built once per run.
pub struct Session<M: Remuxer, T: Tagger> {
    pub client: Client,
    pub settings: Settings,
    pub scratch: ScratchDir,
    pub remuxer: M,
    pub tagger: T,
}

impl<M: Remuxer, T: Tagger> Session<M, T> {
    pub fn orchestrator(&self) -> AcquisitionOrchestrator<'_, M, T> {
        AcquisitionOrchestrator::new(
            &self.client,
            &self.remuxer,
            &self.tagger,
            &self.scratch,
            AcquisitionOptions {
                tier: self.settings.quality,
                entitlement: Entitlement {
                    is_high_tier_subscriber: self.client.plan().is_high_tier(),
                },
                keep_cover: self.settings.keep_cover,
            },
        )
    }

    /// Runs every URL in order. One URL failing never stops the next.
    pub async fn run(&self, urls: &[String]) {
        let total = urls.len();
        for (index, url) in urls.iter().enumerate() {
            println!();
            info!("Item {} of {}:", index + 1, total);

            match MediaKind::from_url(url) {
                Ok(Some(kind)) => {
                    if let Err(e) = self.process_url(url, kind).await {
                        warning!("Item failed: {}", e);
                    }
                }
                Ok(None) => warning!("{}", Error::InvalidUrl(url.clone())),
                Err(e) => warning!("Item failed: {}", e),
            }

            if let Err(e) = self.scratch.cleanup().await {
                warning!("Failed to clean up {}: {}", self.scratch.root().display(), e);
            }
        }
    }

    async fn process_url(&self, url: &str, kind: MediaKind) -> Res<()> {
        match kind {
            MediaKind::Set => {
                let playlist = self.client.resolve(url).await?;
                collections::set(self, playlist, &self.settings.output_path).await
            }
            MediaKind::Track => {
                let permalink = url.split("?in=").next().unwrap_or(url);
                let track = self.client.resolve(permalink).await?;
                collections::track(self, track, url, &self.settings.output_path, 1, 1).await
            }
            MediaKind::Albums => collections::albums(self, url).await,
            MediaKind::Tracks => collections::tracks(self, url).await,
            MediaKind::Likes => collections::likes(self).await,
        }
    }
}

/// Builds the settings from the environment and the command-line flags.
fn settings(opts: &DownloadOptions) -> Res<Settings> {
    let mut settings = Settings::from_env()?;
    if let Some(quality) = opts.quality {
        settings.quality = QualityTier::try_from(quality)?;
    }
    if let Some(path) = &opts.output_path {
        settings.output_path = path.clone();
    }
    if let Some(template) = &opts.template {
        settings.template = template.clone();
    }
    settings.keep_cover |= opts.keep_cover;
    Ok(settings)
}

async fn sign_in(page_delay: std::time::Duration) -> Res<Client> {
    let cookies = CookieJar::load(&config::cookies_path()).await?;
    let web_url = config::web_url();
    let identity = ClientIdManager::resolve(&web_url).await?;
    let identity = identity.current();

    let mut client = Client::new(ClientOptions {
        api_url: config::api_url(),
        web_url,
        client_id: identity.client_id.clone(),
        app_version: identity.app_version.clone(),
        locale: cookies.locale().to_string(),
        oauth_token: cookies.oauth_token()?.to_string(),
        page_delay,
    })?;

    let plan = client.sign_in().await?;
    success!("Signed in successfully - {} account.", plan);
    Ok(client)
}

/// Downloads every URL in `opts`.
///
/// Start-up problems (bad settings, missing cookies, no `ffmpeg`, a failed
/// sign-in) end the program. Once downloading starts, failures are reported
/// per track and per URL. Ctrl-C empties the scratch directory before
/// exiting.
pub async fn download(opts: DownloadOptions) {
    let settings = match settings(&opts) {
        Ok(settings) => settings,
        Err(e) => error!("Invalid configuration: {}", e),
    };

    let urls = match utils::process_urls(&opts.urls).await {
        Ok(urls) => urls,
        Err(e) => error!("Cannot read URLs: {}", e),
    };
    if urls.is_empty() {
        error!("No URLs given.");
    }

    let remuxer = match settings.ffmpeg.clone() {
        Some(path) => FfmpegRemuxer::new(path),
        None => error!("{}", Error::Mux("ffmpeg was not found on PATH".to_string())),
    };

    let client = match sign_in(settings.page_delay).await {
        Ok(client) => client,
        Err(e) => error!("Failed to sign in: {}", e),
    };

    if let Err(e) = async_fs::create_dir_all(&settings.output_path).await {
        error!(
            "Cannot create output folder {}: {}",
            settings.output_path.display(),
            e
        );
    }

    let scratch = match ScratchDir::create(settings.scratch_dir.clone()).await {
        Ok(scratch) => scratch,
        Err(e) => error!("Cannot create scratch folder: {}", e),
    };

    let session = Session {
        client,
        settings,
        scratch,
        remuxer,
        tagger: ContainerTagger,
    };

    tokio::select! {
        _ = session.run(&urls) => {}
        _ = tokio::signal::ctrl_c() => {
            session.scratch.cleanup_now();
            warning!("Interrupted.");
            std::process::exit(130);
        }
    }
}
