// ─── Command Line ───
// clap definitions and a console front end for the launch pipeline.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use crate::core::api::{HttpLaunchApi, LaunchApi};
use crate::core::config::LauncherConfig;
use crate::core::downloader::{Downloader, Fetch};
use crate::core::error::LauncherError;
use crate::core::events::{JreResolution, LaunchEvent, LaunchFrontend};
use crate::core::java::{install_jre, remove_jre, JreDescriptor};
use crate::core::launch::{LaunchOutcome, LaunchRequest, Launcher};
use crate::core::logging;
use crate::core::paths::InstallLayout;
use crate::core::provision::ensure_dir;
use crate::core::settings::{default_settings, SettingsStore, KEY_DOWNLOADED_JRES, KEY_VERSION};
use crate::core::wrapper::create_wrapper;

#[derive(Parser, Debug)]
#[command(name = "solar-launcher", author, about, long_about = None)]
pub struct Cli {
    /// Installation directory [default: ~/.lunarclient]
    #[arg(long, global = true)]
    pub base_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check the installation, patch the config and start the game
    Launch {
        /// Server to join once the game is up
        #[arg(long)]
        server: Option<String>,

        /// Select and remember this game version before launching
        #[arg(long)]
        version: Option<String>,
    },

    /// Write a shortcut wrapper script and print its path
    Wrapper {
        #[arg(long)]
        version: String,

        #[arg(long)]
        server: Option<String>,
    },

    /// Download a JRE from a descriptor file
    InstallJre {
        /// JSON descriptor with `name` and per-architecture `url`/`checksum`/`folder`
        descriptor: PathBuf,
    },

    /// Delete a downloaded JRE
    RemoveJre { name: String },
}

/// Prints status events and asks for a JRE folder on stdin.
pub struct ConsoleFrontend;

#[async_trait]
impl LaunchFrontend for ConsoleFrontend {
    fn emit(&self, event: LaunchEvent) {
        match event {
            LaunchEvent::Status(status) => println!("[{}] {}", status.title(), status.message()),
            LaunchEvent::Launching { active } => debug!("launching = {}", active),
            LaunchEvent::GameStarted { action } => {
                println!("Game started (after launch: {:?})", action)
            }
            LaunchEvent::GameClosed => println!("Game closed"),
        }
    }

    async fn resolve_missing_jre(&self, current: &Path) -> JreResolution {
        println!(
            "No Java runtime found at {}.\nEnter the path of a JRE bin folder, or leave empty to cancel:",
            current.display()
        );
        let mut line = String::new();
        let mut stdin = BufReader::new(tokio::io::stdin());
        match stdin.read_line(&mut line).await {
            Ok(0) | Err(_) => JreResolution::Cancel,
            Ok(_) => {
                let answer = line.trim();
                if answer.is_empty() {
                    JreResolution::Cancel
                } else {
                    JreResolution::Select(PathBuf::from(answer))
                }
            }
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let layout = match cli.base_dir {
        Some(dir) => InstallLayout::new(dir),
        None => InstallLayout::from_home()?,
    };
    logging::init(&layout)?;
    ensure_dir(&layout.tool_dir()).await;

    let config = LauncherConfig::load_or_default(&layout.launcher_config_file());
    let mut settings = SettingsStore::load(layout.settings_file());
    settings.ensure_defaults(default_settings(&layout))?;

    let fetcher: Arc<dyn Fetch> = Arc::new(Downloader::new(config.digest_policy)?);
    let api: Arc<dyn LaunchApi> = Arc::new(HttpLaunchApi::new(config.clone())?);
    let launcher = Launcher::new(
        layout.clone(),
        config,
        Arc::clone(&fetcher),
        api,
        Arc::new(ConsoleFrontend),
    );

    match cli.command {
        Commands::Launch { server, version } => {
            if let Some(version) = version {
                settings.set(KEY_VERSION, &version)?;
            }
            let request = LaunchRequest {
                server_ip: server,
                override_version: None,
            };
            match launcher.check_and_launch(&mut settings, &request).await? {
                LaunchOutcome::Monitoring(handle) => {
                    println!("Game output is written to {}", layout.logs_dir().display());
                    handle.await?;
                }
                LaunchOutcome::Committed => {}
                LaunchOutcome::SpawnFailed(message) => {
                    return Err(LauncherError::LaunchAborted(message).into());
                }
            }
        }
        Commands::Wrapper { version, server } => {
            let metadata = launcher.fetch_metadata(&mut settings, &version).await?;
            let snapshot = settings.snapshot()?;
            let path =
                create_wrapper(&layout, &snapshot, &metadata, &version, server.as_deref()).await?;
            println!("{}", path.display());
        }
        Commands::InstallJre { descriptor } => {
            let raw = tokio::fs::read_to_string(&descriptor)
                .await
                .with_context(|| format!("Cannot read {}", descriptor.display()))?;
            let descriptor: JreDescriptor =
                serde_json::from_str(&raw).context("Invalid JRE descriptor")?;
            let path = install_jre(fetcher.as_ref(), &layout, &descriptor).await?;

            let mut installed: Vec<String> = settings.get(KEY_DOWNLOADED_JRES)?.unwrap_or_default();
            if !installed.contains(&descriptor.name) {
                installed.push(descriptor.name.clone());
                settings.set(KEY_DOWNLOADED_JRES, &installed)?;
            }
            println!("Installed {} to {}", descriptor.name, path.display());
        }
        Commands::RemoveJre { name } => {
            remove_jre(&layout, &name).await?;
            let mut installed: Vec<String> = settings.get(KEY_DOWNLOADED_JRES)?.unwrap_or_default();
            installed.retain(|jre| jre != &name);
            settings.set(KEY_DOWNLOADED_JRES, &installed)?;
            println!("Removed {}", name);
        }
    }

    Ok(())
}
