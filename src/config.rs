// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use std::path::Path;

use config::{Config, Environment, File, FileFormat};
use tracing::info;

mod error;
mod sound;

pub use self::error::ConfigError;
pub use self::sound::{Channel, Sound};

/// Prefix for environment variable overrides, e.g. `SPATIALMIX_MASTER_VOLUME=50`.
const ENV_PREFIX: &str = "SPATIALMIX";

/// Loads the sound configuration from a YAML file, with environment overrides on top.
pub fn load(path: &Path) -> Result<Sound, ConfigError> {
    let sound: Sound = Config::builder()
        .add_source(File::from(path).format(FileFormat::Yaml))
        .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
        .build()?
        .try_deserialize()?;

    info!(
        path = path.display().to_string(),
        device = sound.device(),
        sample_rate = sound.sample_rate(),
        enabled = sound.enabled(),
        "Loaded sound configuration"
    );
    Ok(sound)
}

/// Builds the configuration from environment overrides alone.
pub fn from_env() -> Result<Sound, ConfigError> {
    Ok(Config::builder()
        .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
        .build()?
        .try_deserialize()?)
}
