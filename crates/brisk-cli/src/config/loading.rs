use crate::config::{BriskConfig, ConfigOverrides, Mode, CONFIG_FILE};
use crate::error::{ConfigError, Result};
use figment::{
    providers::{Env, Format as _, Json, Serialized},
    Figment,
};
use std::path::Path;

/// Environment variable prefix, e.g. `BRISK_PORT=3000`.
pub const ENV_PREFIX: &str = "BRISK_";

/// Snake-case names accepted after [`ENV_PREFIX`], matched case-insensitively.
const ENV_KEYS: &[&str] = &[
    "source_root",
    "destination",
    "watch",
    "port",
    "host",
    "minify",
    "source_maps",
    "stylesheet_handling",
    "recursive",
    "debounce_ms",
    "compile_timeout_ms",
    "root_document",
    "target",
];

impl BriskConfig {
    /// Load configuration from multiple sources.
    /// Priority: CLI overrides > `BRISK_*` variables > config file > mode defaults
    ///
    /// `config_path` is resolved against `cwd`; when it is `None`,
    /// `brisk.config.json` in `cwd` is used if present.
    pub fn load(
        mode: Mode,
        overrides: &ConfigOverrides,
        config_path: Option<&Path>,
        cwd: &Path,
    ) -> Result<Self> {
        let mut figment = Figment::new().merge(Serialized::defaults(Self::defaults_for(mode)));

        let config_file = match config_path {
            Some(path) => {
                let path = cwd.join(path);
                if !path.is_file() {
                    return Err(ConfigError::NotFound(path).into());
                }
                Some(path)
            }
            None => {
                let default_path = cwd.join(CONFIG_FILE);
                default_path.is_file().then_some(default_path)
            }
        };

        if let Some(path) = config_file {
            tracing::debug!("Loading configuration from {}", path.display());
            figment = figment.merge(Json::file(path));
        }

        figment = figment.merge(
            Env::prefixed(ENV_PREFIX)
                .lowercase(false)
                .filter(|key| is_env_key(key.as_str()))
                .map(|key| env_key_to_field(key.as_str()).into()),
        );

        figment = figment.merge(Serialized::defaults(overrides));

        figment
            .extract()
            .map_err(|e| ConfigError::Invalid(e.to_string()).into())
    }
}

fn is_env_key(key: &str) -> bool {
    ENV_KEYS.iter().any(|known| known.eq_ignore_ascii_case(key))
}

/// Map a variable suffix to its camelCase field (`SOURCE_ROOT` -> `sourceRoot`).
pub(crate) fn env_key_to_field(key: &str) -> String {
    let mut field = String::with_capacity(key.len());
    let mut upper = false;
    for c in key.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            field.push(c.to_ascii_uppercase());
            upper = false;
        } else {
            field.push(c.to_ascii_lowercase());
        }
    }
    field
}
