use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub identity: IdentityConfig,
    pub sandbox: SandboxConfig,
    pub services: ServicesConfig,
    pub terminal: TerminalConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            identity: IdentityConfig::default(),
            sandbox: SandboxConfig::default(),
            services: ServicesConfig::default(),
            terminal: TerminalConfig::default(),
        }
    }
}

/// Who the portfolio belongs to. Also the static profile shown before (or
/// instead of) a fetched one.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct IdentityConfig {
    pub github_username: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub linkedin_url: String,
    pub about: String,
}

impl IdentityConfig {
    pub fn github_url(&self) -> String {
        format!("https://github.com/{}", self.github_username)
    }
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            github_username: "octocat".to_string(),
            name: "Octocat".to_string(),
            email: "octocat@example.com".to_string(),
            phone: String::new(),
            linkedin_url: "https://www.linkedin.com/".to_string(),
            about: "A passionate software engineer with a keen interest in open-source contributions."
                .to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct SandboxConfig {
    pub shell: String,
    pub shell_args: Vec<String>,
    pub idle_timeout_secs: u64,
    pub sweep_interval_secs: u64,
    pub command_timeout_secs: u64,
}

impl SandboxConfig {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs.max(1))
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs.max(1))
    }
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            shell: "sh".to_string(),
            shell_args: vec!["-s".to_string()],
            idle_timeout_secs: 5 * 60,
            sweep_interval_secs: 60,
            command_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ServicesConfig {
    pub advice_url: String,
    pub github_api_base: String,
    pub user_agent: String,
    pub profile_cache_path: Option<PathBuf>,
    /// Skip every profile request and stay on the static identity profile.
    pub offline: bool,
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            advice_url: "https://api.adviceslip.com/advice".to_string(),
            github_api_base: "https://api.github.com".to_string(),
            user_agent: concat!("folio-portfolio/", env!("CARGO_PKG_VERSION")).to_string(),
            profile_cache_path: None,
            offline: false,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct TerminalConfig {
    pub history_limit: usize,
    pub prompt_host: String,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            history_limit: 500,
            prompt_host: "homegroup".to_string(),
        }
    }
}
