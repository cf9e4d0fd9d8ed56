//! Loading session parameters from a versioned TOML file.

use std::{fs, path::Path, time::Duration};

use anyhow::{bail, Context, Result};
use calm_rally_core::SessionConfig;
use serde::Deserialize;

const SUPPORTED_CONFIG_VERSION: u32 = 1;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    version: u32,
    #[serde(default)]
    session: SessionSection,
}

/// Overrides applied on top of the default session parameters.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct SessionSection {
    min_speed: Option<f32>,
    max_speed: Option<f32>,
    speed_increment: Option<f32>,
    spawn_delay_secs: Option<f32>,
    spawn_warmup_secs: Option<f32>,
    game_time_secs: Option<f32>,
    misses_before_simplify: Option<u32>,
    enable_wave_mode: Option<bool>,
    introduction: Option<String>,
    intro_duration_secs: Option<f32>,
    stillness_threshold: Option<f32>,
    encouragement_after_secs: Option<f32>,
    overstimulation_after_secs: Option<f32>,
    overstimulation_recovery_secs: Option<f32>,
    max_live_balls: Option<usize>,
}

/// Reads and validates the session configuration stored at `path`.
pub(crate) fn load(path: &Path) -> Result<SessionConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read session config at {}", path.display()))?;
    parse(&contents).with_context(|| format!("invalid session config at {}", path.display()))
}

/// Parses and validates session configuration from TOML text.
pub(crate) fn parse(contents: &str) -> Result<SessionConfig> {
    let file: ConfigFile =
        toml::from_str(contents).context("failed to parse session config toml contents")?;
    if file.version != SUPPORTED_CONFIG_VERSION {
        bail!(
            "unsupported session config version {} (expected {SUPPORTED_CONFIG_VERSION})",
            file.version
        );
    }

    let section = file.session;
    let mut config = SessionConfig::default();
    override_value(&mut config.min_speed, section.min_speed);
    override_value(&mut config.max_speed, section.max_speed);
    override_value(&mut config.speed_increment, section.speed_increment);
    override_secs(&mut config.spawn_delay, section.spawn_delay_secs, "spawn_delay_secs")?;
    override_secs(&mut config.spawn_warmup, section.spawn_warmup_secs, "spawn_warmup_secs")?;
    override_secs(&mut config.game_time, section.game_time_secs, "game_time_secs")?;
    override_value(&mut config.misses_before_simplify, section.misses_before_simplify);
    override_value(&mut config.enable_wave_mode, section.enable_wave_mode);
    if let Some(text) = section.introduction {
        config.introduction = Some(text);
    }
    override_secs(
        &mut config.intro_duration,
        section.intro_duration_secs,
        "intro_duration_secs",
    )?;
    override_value(&mut config.stillness_threshold, section.stillness_threshold);
    override_secs(
        &mut config.encouragement_after,
        section.encouragement_after_secs,
        "encouragement_after_secs",
    )?;
    override_secs(
        &mut config.overstimulation_after,
        section.overstimulation_after_secs,
        "overstimulation_after_secs",
    )?;
    override_secs(
        &mut config.overstimulation_recovery,
        section.overstimulation_recovery_secs,
        "overstimulation_recovery_secs",
    )?;
    override_value(&mut config.max_live_balls, section.max_live_balls);

    config
        .validate()
        .context("session config failed validation")?;
    Ok(config)
}

fn override_value<T>(target: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *target = value;
    }
}

fn override_secs(target: &mut Duration, secs: Option<f32>, key: &str) -> Result<()> {
    if let Some(secs) = secs {
        *target = Duration::try_from_secs_f32(secs)
            .with_context(|| format!("`{key}` must be a non-negative number of seconds"))?;
    }
    Ok(())
}
