// ─── Game Process ───
// Spawns the JVM detached from the launcher and watches its output streams.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::core::error::LauncherError;
use crate::core::events::{LaunchEvent, LaunchFrontend, LaunchStatus};
use crate::core::settings::ActionAfterLaunch;

/// One fully prepared game launch.
#[derive(Debug, Clone)]
pub struct GameLaunch {
    pub java: PathBuf,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
    /// Receives stdout and stderr; truncated on every launch.
    pub log_path: PathBuf,
    pub version: String,
    pub action: ActionAfterLaunch,
    pub debug_mode: bool,
    /// Delay between the first output and the commit.
    pub commit_delay: Duration,
}

#[derive(Debug)]
pub enum LaunchOutcome {
    /// Debug mode: output is inherited and the launch was committed right away.
    Committed,
    /// The output monitor runs until the game closes its stdout.
    Monitoring(JoinHandle<()>),
    /// The process could not be started; already logged and reported.
    SpawnFailed(String),
}

/// Returns the front end to its idle state.
pub fn commit_launch(frontend: &dyn LaunchFrontend, version: &str) {
    frontend.status(LaunchStatus::Ready {
        version: version.to_string(),
    });
    frontend.emit(LaunchEvent::Launching { active: false });
}

/// Spawns the game. Failures are logged and reported through the front end
/// rather than returned.
pub async fn launch_game(launch: GameLaunch, frontend: Arc<dyn LaunchFrontend>) -> LaunchOutcome {
    frontend.status(LaunchStatus::StartingJvm);

    let mut cmd = Command::new(&launch.java);
    cmd.args(&launch.args).current_dir(&launch.working_dir);
    configure_detached_spawn(&mut cmd);

    if launch.debug_mode {
        cmd.stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
    } else {
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
    }

    info!("Launching game with Java: {:?}", launch.java);
    debug!("Launching game with args {:?}", launch.args);

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(err) => {
            let message = LauncherError::Spawn(err.to_string()).to_string();
            error!("{}", message);
            frontend.status(LaunchStatus::Error {
                message: message.clone(),
            });
            frontend.emit(LaunchEvent::Launching { active: false });
            return LaunchOutcome::SpawnFailed(message);
        }
    };

    if launch.debug_mode {
        commit_launch(frontend.as_ref(), &launch.version);
        reap(child);
        return LaunchOutcome::Committed;
    }

    let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
        warn!("Game output is not available, committing without monitoring");
        commit_launch(frontend.as_ref(), &launch.version);
        reap(child);
        return LaunchOutcome::Committed;
    };
    reap(child);

    let hooks = OutputHooks {
        frontend,
        version: launch.version,
        action: launch.action,
        commit_delay: launch.commit_delay,
    };
    let log_path = launch.log_path;
    let handle = tokio::spawn(async move {
        match tokio::fs::File::create(&log_path).await {
            Ok(file) => {
                debug!("Created game logger, log file path: {:?}", log_path);
                monitor_output(stdout, stderr, file, hooks).await;
            }
            Err(err) => {
                error!("Cannot create game log {:?}: {}", log_path, err);
                monitor_output(stdout, stderr, tokio::io::sink(), hooks).await;
            }
        }
    });

    LaunchOutcome::Monitoring(handle)
}

/// Logs the exit status once the child is reaped.
fn reap(mut child: tokio::process::Child) {
    tokio::spawn(async move {
        match child.wait().await {
            Ok(status) => info!("Game process exited with {}", status),
            Err(err) => warn!("Cannot wait for game process: {}", err),
        }
    });
}

#[cfg(unix)]
fn configure_detached_spawn(cmd: &mut Command) {
    cmd.process_group(0);
}

#[cfg(windows)]
fn configure_detached_spawn(cmd: &mut Command) {
    const DETACHED_PROCESS: u32 = 0x0000_0008;
    const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;
    cmd.creation_flags(DETACHED_PROCESS | CREATE_NEW_PROCESS_GROUP);
}

// ── Output monitoring ───────────────────────────────────

/// What the monitor reports to while the game runs.
pub struct OutputHooks {
    pub frontend: Arc<dyn LaunchFrontend>,
    pub version: String,
    pub action: ActionAfterLaunch,
    pub commit_delay: Duration,
}

/// Copies both streams into `sink` and drives the start/close signals.
///
/// The first stdout chunk means the game is up: the post-launch action is
/// emitted and the commit follows after `commit_delay`. The end of stdout
/// means the window closed. A game that closes stdout without printing
/// anything is committed at that point.
pub async fn monitor_output<O, E, W>(stdout: O, stderr: E, sink: W, hooks: OutputHooks)
where
    O: AsyncRead + Unpin + Send + 'static,
    E: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel::<Vec<u8>>();
    let writer = tokio::spawn(write_log(rx, sink));
    let stderr_pump = tokio::spawn(pump(stderr, tx.clone()));

    let mut stdout = stdout;
    let mut buf = vec![0u8; 8192];
    let mut commit: Option<JoinHandle<()>> = None;

    loop {
        match stdout.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                if commit.is_none() {
                    info!("Game initialized, applying {:?}", hooks.action);
                    hooks.frontend.emit(LaunchEvent::GameStarted {
                        action: hooks.action,
                    });
                    let frontend = Arc::clone(&hooks.frontend);
                    let version = hooks.version.clone();
                    let delay = hooks.commit_delay;
                    commit = Some(tokio::spawn(async move {
                        tokio::time::sleep(delay).await;
                        commit_launch(frontend.as_ref(), &version);
                    }));
                }
                let _ = tx.send(buf[..n].to_vec());
            }
            Err(err) => {
                error!("Failed to read game output: {}", err);
                break;
            }
        }
    }
    drop(tx);

    info!("Game output ended");
    hooks.frontend.emit(LaunchEvent::GameClosed);

    match commit {
        Some(handle) => {
            let _ = handle.await;
        }
        None => {
            warn!("Game closed without producing output");
            commit_launch(hooks.frontend.as_ref(), &hooks.version);
        }
    }

    let _ = stderr_pump.await;
    let _ = writer.await;
}

async fn pump<R: AsyncRead + Unpin>(mut reader: R, tx: mpsc::UnboundedSender<Vec<u8>>) {
    let mut buf = vec![0u8; 8192];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                if tx.send(buf[..n].to_vec()).is_err() {
                    break;
                }
            }
            Err(err) => {
                error!("Failed to read game error output: {}", err);
                break;
            }
        }
    }
}

async fn write_log<W: AsyncWrite + Unpin>(mut rx: mpsc::UnboundedReceiver<Vec<u8>>, mut sink: W) {
    while let Some(chunk) = rx.recv().await {
        if let Err(err) = sink.write_all(&chunk).await {
            error!("Failed to write game log: {}", err);
            return;
        }
    }
    let _ = sink.flush().await;
}
