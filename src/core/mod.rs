// ─── Solar Launcher Core ───
// Download, verify and launch pipeline for the patched game client.
//
// Architecture:
//   core/
//     paths/settings/config filesystem layout and persisted documents
//     downloader/           content-addressed fetches with digest policy
//     provision/assets      directory tree, texture sync
//     java/natives/patcher  JRE, native libraries, agent config
//     reconciler            idempotent installation checks
//     launch/               argument builder + process launcher
//     wrapper               shortcut scripts

pub mod api;
pub mod assets;
pub mod config;
pub mod downloader;
pub mod error;
pub mod events;
pub mod http;
pub mod java;
pub mod launch;
pub mod logging;
pub mod natives;
pub mod patcher;
pub mod paths;
pub mod provision;
pub mod reconciler;
pub mod settings;
pub mod wrapper;

#[cfg(test)]
pub mod testing;
