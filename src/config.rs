use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

use crate::error::{ReleaseError, Result};

pub const GUTENBERG_REPO: &str = "gutenberg";
pub const GUTENBERG_MOBILE_REPO: &str = "gutenberg-mobile";
pub const WORDPRESS_ANDROID_REPO: &str = "WordPress-Android";
pub const WORDPRESS_IOS_REPO: &str = "WordPress-iOS";
pub const JETPACK_REPO: &str = "jetpack";

const DEFAULT_WPMOBILE_ORG: &str = "wordpress-mobile";
const DEFAULT_WORDPRESS_ORG: &str = "WordPress";
const DEFAULT_AUTOMATTIC_ORG: &str = "Automattic";

/// GitHub org overrides as they appear in an optional `gbm.toml`.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
struct ConfigFile {
    #[serde(default)]
    wpmobile_org: Option<String>,
    #[serde(default)]
    wordpress_org: Option<String>,
    #[serde(default)]
    automattic_org: Option<String>,
}

/// Runtime configuration for a release run.
///
/// Everything that used to be ambient (org names from the environment, CI
/// detection) lives here explicitly so it can be overridden per test and
/// passed into the GitHub client constructor.
#[derive(Debug, Clone)]
pub struct Config {
    pub wpmobile_org: String,
    pub wordpress_org: String,
    pub automattic_org: String,

    /// Answer yes to every confirmation prompt (set by `CI=true`).
    pub assume_yes: bool,

    /// Echo subprocess output instead of capturing it.
    pub verbose: bool,

    /// Skip temp-workspace creation (`GBM_NO_WORKSPACE`).
    pub no_workspace: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            wpmobile_org: DEFAULT_WPMOBILE_ORG.to_string(),
            wordpress_org: DEFAULT_WORDPRESS_ORG.to_string(),
            automattic_org: DEFAULT_AUTOMATTIC_ORG.to_string(),
            assume_yes: false,
            verbose: false,
            no_workspace: false,
        }
    }
}

impl Config {
    /// Builds the configuration in precedence order: defaults, then an
    /// optional `gbm.toml` (current directory, then the user config dir),
    /// then the `GBM_*_ORG` environment variables.
    pub fn from_env() -> Result<Config> {
        let mut config = Config::default();

        if let Some(file) = load_config_file(None)? {
            config.apply_file(&file);
        }

        if let Ok(org) = env::var("GBM_WPMOBILE_ORG") {
            config.wpmobile_org = org;
        }
        if let Ok(org) = env::var("GBM_WORDPRESS_ORG") {
            config.wordpress_org = org;
        }
        if let Ok(org) = env::var("GBM_AUTOMATTIC_ORG") {
            config.automattic_org = org;
        }

        config.assume_yes = env::var("CI").map(|v| v == "true").unwrap_or(false);
        config.no_workspace = env::var("GBM_NO_WORKSPACE").is_ok();

        Ok(config)
    }

    fn apply_file(&mut self, file: &ConfigFile) {
        if let Some(org) = &file.wpmobile_org {
            self.wpmobile_org = org.clone();
        }
        if let Some(org) = &file.wordpress_org {
            self.wordpress_org = org.clone();
        }
        if let Some(org) = &file.automattic_org {
            self.automattic_org = org.clone();
        }
    }

    /// The GitHub org owning the given repository.
    pub fn org_for(&self, repo: &str) -> Result<&str> {
        match repo {
            GUTENBERG_REPO => Ok(&self.wordpress_org),
            JETPACK_REPO => Ok(&self.automattic_org),
            GUTENBERG_MOBILE_REPO | WORDPRESS_ANDROID_REPO | WORDPRESS_IOS_REPO => {
                Ok(&self.wpmobile_org)
            }
            other => Err(ReleaseError::config(format!(
                "no org configured for repo {}",
                other
            ))),
        }
    }

    /// The https clone URL for the given repository.
    pub fn https_url(&self, repo: &str) -> Result<String> {
        Ok(format!("https://github.com/{}/{}", self.org_for(repo)?, repo))
    }
}

fn load_config_file(custom_path: Option<&str>) -> Result<Option<ConfigFile>> {
    let contents = if let Some(path) = custom_path {
        Some(fs::read_to_string(path)?)
    } else if Path::new("./gbm.toml").exists() {
        Some(fs::read_to_string("./gbm.toml")?)
    } else if let Some(config_dir) = dirs::config_dir() {
        let path = config_dir.join("gbm.toml");
        if path.exists() {
            Some(fs::read_to_string(path)?)
        } else {
            None
        }
    } else {
        None
    };

    match contents {
        Some(raw) => {
            let file: ConfigFile = toml::from_str(&raw)
                .map_err(|e| ReleaseError::config(format!("could not parse gbm.toml: {}", e)))?;
            Ok(Some(file))
        }
        None => Ok(None),
    }
}
