// ─── Launch Arguments ───
// Builds the JVM + game argument vector from settings, metadata and the install layout.

use std::path::Path;

use crate::core::api::RemoteMetadata;
use crate::core::paths::InstallLayout;
use crate::core::settings::LaunchSettings;

/// Jars put on the class path, in order, from `offline/<version>/`.
pub const CLASSPATH_JARS: [&str; 7] = [
    "lunar-assets-prod-1-optifine.jar",
    "lunar-assets-prod-2-optifine.jar",
    "lunar-assets-prod-3-optifine.jar",
    "lunar-prod-optifine.jar",
    "lunar-libs.jar",
    "vpatcher-prod.jar",
    "Optifine.jar",
];

/// Extra class path entry for 1.7.
pub const LEGACY_OPTIFINE_JAR: &str = "OptiFine_1.7.10_HD_U_E7";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    Unix,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            Platform::Windows
        } else {
            Platform::Unix
        }
    }

    pub fn classpath_separator(self) -> &'static str {
        match self {
            Platform::Windows => ";",
            Platform::Unix => ":",
        }
    }
}

/// Everything the argument vector depends on.
#[derive(Debug, Clone, Copy)]
pub struct ArgumentContext<'a> {
    pub layout: &'a InstallLayout,
    pub metadata: &'a RemoteMetadata,
    pub settings: &'a LaunchSettings,
    /// Whether `solar-patcher.jar` exists; the agent is only added when it does.
    pub patcher_present: bool,
    pub server_ip: Option<&'a str>,
    pub override_version: Option<&'a str>,
    /// Shortcut wrappers keep the quotes around paths; direct spawns strip them.
    pub for_shortcut: bool,
    pub platform: Platform,
}

impl<'a> ArgumentContext<'a> {
    pub fn effective_version(&self) -> &'a str {
        self.override_version.unwrap_or(&self.settings.version)
    }
}

/// `--assetIndex` value for a game version.
pub fn asset_index(version: &str) -> &str {
    if version == "1.7" {
        "1.7.10"
    } else {
        version
    }
}

pub fn classpath(layout: &InstallLayout, version: &str, platform: Platform) -> String {
    let version_dir = layout.version_dir(version);
    let mut jars: Vec<String> = CLASSPATH_JARS
        .iter()
        .map(|jar| quoted(&version_dir.join(jar)))
        .collect();
    if version == "1.7" {
        jars.push(quoted(&version_dir.join(LEGACY_OPTIFINE_JAR)));
    }
    jars.join(platform.classpath_separator())
}

/// Builds the full argument vector passed after the java executable.
pub fn build_arguments(ctx: &ArgumentContext<'_>) -> Vec<String> {
    let version = ctx.effective_version();
    let settings = ctx.settings;
    let natives = quoted(&ctx.layout.natives_dir(version));

    let mut args: Vec<String> = ctx.metadata.jre.extra_arguments.clone();
    if let Some(template) = args.iter_mut().find(|arg| arg.contains("natives")) {
        *template = template.replacen("natives", &natives, 1);
    }

    if ctx.patcher_present {
        args.push(format!(
            "-javaagent:{}={}",
            quoted(&ctx.layout.patcher_jar()),
            quoted(&ctx.layout.patcher_config())
        ));
    }

    args.extend(settings.jvm_arguments.split_whitespace().map(str::to_string));
    args.push(format!("-Xmx{}m", settings.ram));
    args.push(format!("-Djava.library.path={natives}"));
    args.push(format!(
        "-Dsolar.launchType={}",
        if ctx.for_shortcut { "shortcut" } else { "launcher" }
    ));
    args.push("-cp".to_string());
    args.push(classpath(ctx.layout, version, ctx.platform));
    args.push(ctx.metadata.launch_type_data.main_class.clone());

    let game_dir = settings.launch_directory(version);
    args.extend([
        "--version".to_string(),
        version.to_string(),
        "--accessToken".to_string(),
        "0".to_string(),
        "--assetIndex".to_string(),
        asset_index(version).to_string(),
        "--userProperties".to_string(),
        "{}".to_string(),
        "--gameDir".to_string(),
        quoted(&game_dir),
        "--texturesDir".to_string(),
        quoted(&ctx.layout.textures_dir()),
        "--width".to_string(),
        settings.resolution.width.to_string(),
        "--height".to_string(),
        settings.resolution.height.to_string(),
    ]);

    if let Some(ip) = ctx.server_ip.filter(|ip| !ip.is_empty()) {
        args.push("--server".to_string());
        args.push(format!("\"{ip}\""));
    }

    if !ctx.for_shortcut {
        for arg in &mut args {
            arg.retain(|c| c != '"');
        }
    }

    args
}

fn quoted(path: &Path) -> String {
    format!("\"{}\"", path.display())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::core::settings::{ActionAfterLaunch, LaunchDirectory, Resolution};
    use crate::core::testing::sample_metadata;

    fn settings(version: &str) -> LaunchSettings {
        LaunchSettings {
            version: version.into(),
            ram: 3072,
            resolution: Resolution {
                width: 1280,
                height: 720,
            },
            jre_path: PathBuf::from("/jre/bin"),
            jvm_arguments: "-XX:+DisableAttachMechanism  -Dfoo=1".into(),
            launch_directories: vec![
                LaunchDirectory {
                    version: "1.7".into(),
                    path: PathBuf::from("/games/legacy"),
                },
                LaunchDirectory {
                    version: "1.8".into(),
                    path: PathBuf::from("/games/pvp"),
                },
            ],
            action_after_launch: ActionAfterLaunch::Close,
            skip_checks: false,
            debug_mode: false,
            customizations: Vec::new(),
        }
    }

    fn build(
        settings: &LaunchSettings,
        patcher_present: bool,
        server_ip: Option<&str>,
        override_version: Option<&str>,
        for_shortcut: bool,
        platform: Platform,
    ) -> Vec<String> {
        let layout = InstallLayout::new("/home/alex/.lunarclient");
        let metadata = sample_metadata();
        build_arguments(&ArgumentContext {
            layout: &layout,
            metadata: &metadata,
            settings,
            patcher_present,
            server_ip,
            override_version,
            for_shortcut,
            platform,
        })
    }

    fn value_after<'a>(args: &'a [String], flag: &str) -> &'a str {
        let index = args.iter().position(|a| a == flag).unwrap();
        &args[index + 1]
    }

    #[test]
    fn asset_index_maps_legacy_version() {
        assert_eq!(asset_index("1.7"), "1.7.10");
        assert_eq!(asset_index("1.8"), "1.8");
        assert_eq!(asset_index("1.18"), "1.18");
    }

    #[test]
    fn classpath_separator_follows_platform() {
        let layout = InstallLayout::new("/lc");
        let windows = classpath(&layout, "1.8", Platform::Windows);
        let unix = classpath(&layout, "1.8", Platform::Unix);

        assert_eq!(windows.matches(';').count(), 6);
        assert!(!windows.contains(':') || cfg!(windows));
        assert_eq!(unix.split(':').count(), 7);
        assert!(!unix.contains(';'));
    }

    #[test]
    fn legacy_version_adds_optifine_jar() {
        let layout = InstallLayout::new("/lc");
        let legacy = classpath(&layout, "1.7", Platform::Unix);
        assert_eq!(legacy.split(':').count(), 8);
        assert!(legacy.ends_with("OptiFine_1.7.10_HD_U_E7\""));
    }

    #[test]
    fn launcher_arguments_are_unquoted_and_ordered() {
        let args = build(&settings("1.8"), true, None, None, false, Platform::Unix);

        assert!(args.iter().all(|a| !a.contains('"')));
        assert_eq!(
            args[0],
            "-Djava.library.path=/home/alex/.lunarclient/offline/1.8/natives"
        );
        assert_eq!(args[1], "-XX:+UseG1GC");
        assert_eq!(
            args[2],
            "-javaagent:/home/alex/.lunarclient/solartweaks/solar-patcher.jar=/home/alex/.lunarclient/solartweaks/config.json"
        );
        assert_eq!(args[3], "-XX:+DisableAttachMechanism");
        assert_eq!(args[4], "-Dfoo=1");
        assert_eq!(args[5], "-Xmx3072m");
        assert_eq!(args[7], "-Dsolar.launchType=launcher");
        assert_eq!(args[8], "-cp");
        assert_eq!(args[10], "com.moonsworth.lunar.patcher.LunarMain");
        assert_eq!(value_after(&args, "--version"), "1.8");
        assert_eq!(value_after(&args, "--accessToken"), "0");
        assert_eq!(value_after(&args, "--assetIndex"), "1.8");
        assert_eq!(value_after(&args, "--userProperties"), "{}");
        assert_eq!(value_after(&args, "--gameDir"), "/games/pvp");
        assert_eq!(
            value_after(&args, "--texturesDir"),
            "/home/alex/.lunarclient/textures"
        );
        assert_eq!(value_after(&args, "--width"), "1280");
        assert_eq!(args.last().unwrap(), "720");
    }

    #[test]
    fn shortcut_arguments_keep_quotes_and_server() {
        let args = build(
            &settings("1.8"),
            false,
            Some("hypixel.net"),
            None,
            true,
            Platform::Windows,
        );

        assert!(args.iter().all(|a| !a.starts_with("-javaagent")));
        assert!(args.contains(&"-Dsolar.launchType=shortcut".to_string()));
        assert_eq!(value_after(&args, "--gameDir"), "\"/games/pvp\"");
        assert_eq!(value_after(&args, "--server"), "\"hypixel.net\"");
        assert!(value_after(&args, "-cp").contains("\";\""));
    }

    #[test]
    fn override_version_drives_paths_and_asset_index() {
        let args = build(&settings("1.8"), false, None, Some("1.7"), false, Platform::Unix);

        assert_eq!(value_after(&args, "--version"), "1.7");
        assert_eq!(value_after(&args, "--assetIndex"), "1.7.10");
        assert_eq!(value_after(&args, "--gameDir"), "/games/legacy");
        assert!(args[0].ends_with("offline/1.7/natives"));
        assert!(value_after(&args, "-cp").contains("OptiFine_1.7.10_HD_U_E7"));
    }
}
