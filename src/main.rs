#![forbid(unsafe_code)]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, Level as TraceLevel};
use tracing_subscriber::FmtSubscriber;

use magnifier_settings::config::{AppSettings, ConfigLocations, FixedAnswer, FsStorage, ProfileRef, ScalingProfile};
use magnifier_settings::constants::defaults::NO_SCALING_MODE;

/// Inspect and normalize the magnifier's settings document
#[derive(Parser, Debug)]
#[command(name = "magnifier-settings")]
#[command(about = "Inspect and normalize the magnifier settings document")]
struct Args {
    /// Directory checked for a portable settings document
    #[arg(long, global = true)]
    portable_dir: Option<PathBuf>,

    /// Per-user settings directory
    #[arg(long, global = true)]
    user_dir: Option<PathBuf>,

    /// Load documents written by a newer version instead of refusing them
    #[arg(long, global = true)]
    accept_newer: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Summary of the loaded settings
    Show,
    /// User profiles in matching order
    Profiles,
    /// Which profile a window would use
    Match {
        /// Executable path, or app user model id for packaged apps
        #[arg(long)]
        path: String,
        /// Window class name
        #[arg(long)]
        class: String,
        #[arg(long)]
        packaged: bool,
    },
    /// Load and save again, rewriting the document in canonical form
    Normalize,
}

fn main() -> Result<()> {
    let log_level = match std::env::var("LOG_LEVEL")
        .unwrap_or_else(|_| "warn".to_string())
        .to_lowercase()
        .as_str()
    {
        "trace" => TraceLevel::TRACE,
        "debug" => TraceLevel::DEBUG,
        "info" => TraceLevel::INFO,
        "error" => TraceLevel::ERROR,
        _ => TraceLevel::WARN,
    };

    // Logs go to stderr so command output stays clean
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();
    let locations = resolve_locations(&args)?;
    let settings = AppSettings::load(locations, FsStorage, &FixedAnswer(args.accept_newer))
        .context("Failed to load settings")?;

    match &args.command {
        Command::Show => show(&settings),
        Command::Profiles => list_profiles(&settings),
        Command::Match { path, class, packaged } => {
            let found = settings.find_profile(path, class, *packaged);
            let profile = settings
                .profile(found)
                .context("Matched profile disappeared")?;
            println!("{}", describe_profile(&settings, found, &profile));
        }
        Command::Normalize => {
            let path = settings.config_path();
            settings.shutdown().context("Failed to save settings")?;
            info!(path = %path.display(), "Normalized settings document");
            println!("{}", path.display());
        }
    }

    Ok(())
}

fn resolve_locations(args: &Args) -> Result<ConfigLocations> {
    if let (Some(portable_dir), Some(user_dir)) = (&args.portable_dir, &args.user_dir) {
        return Ok(ConfigLocations::new(portable_dir.clone(), user_dir.clone()));
    }

    let mut locations =
        ConfigLocations::from_environment().context("Failed to determine settings directories")?;
    if let Some(dir) = &args.portable_dir {
        locations.portable_dir = dir.clone();
    }
    if let Some(dir) = &args.user_dir {
        locations.user_dir = dir.clone();
    }
    Ok(locations)
}

fn show(settings: &AppSettings) {
    let model = settings.model();

    println!("path:            {}", settings.config_path().display());
    println!("portable:        {}", settings.is_portable_mode());
    println!("theme:           {:?}", model.theme);

    let rect = model.window_rect;
    println!(
        "window:          {}x{} at ({}, {}){}",
        rect.width,
        rect.height,
        rect.x,
        rect.y,
        if model.is_window_maximized { ", maximized" } else { "" }
    );

    for (action, hotkey) in model.hotkeys.iter() {
        println!("hotkey {:<9} {}", format!("{action}:"), hotkey);
    }

    println!("auto restore:    {}", model.auto_restore);
    println!("down count:      {}", model.down_count);
    println!("tray icon:       {}", model.show_tray_icon);
    println!("run elevated:    {}", model.always_run_as_elevated);
    println!("debug mode:      {}", model.debug_mode);

    match &model.downscaling_effect {
        Some(effect) => println!("downscaling:     {}", effect.name),
        None => println!("downscaling:     none"),
    }

    println!("scaling modes:   {}", model.scaling_modes.len());
    for (index, mode) in model.scaling_modes.modes().iter().enumerate() {
        let effects: Vec<&str> = mode.effects.iter().map(|e| e.name.as_str()).collect();
        println!("  [{index}] {} ({})", mode.name, effects.join(" -> "));
    }

    println!("profiles:        {}", model.profiles.profile_count());
}

fn list_profiles(settings: &AppSettings) {
    let profiles = settings.profiles();
    println!("{}", describe_profile(settings, ProfileRef::Default, profiles.default_profile()));
    for (index, profile) in profiles.profiles().iter().enumerate() {
        println!("{}", describe_profile(settings, ProfileRef::User(index), profile));
    }
}

fn describe_profile(settings: &AppSettings, handle: ProfileRef, profile: &ScalingProfile) -> String {
    let mode = if profile.scaling_mode == NO_SCALING_MODE {
        "none".to_string()
    } else {
        usize::try_from(profile.scaling_mode)
            .ok()
            .and_then(|index| settings.scaling_modes().get(index).map(|mode| mode.name.clone()))
            .unwrap_or_else(|| format!("#{}", profile.scaling_mode))
    };

    match handle {
        ProfileRef::Default => format!("[default] scaling mode: {mode}"),
        ProfileRef::User(index) => format!(
            "[{index}] {} ({}{}, class {}) scaling mode: {mode}",
            profile.name,
            if profile.is_packaged { "packaged " } else { "" },
            profile.path_rule,
            profile.class_name_rule,
        ),
    }
}
