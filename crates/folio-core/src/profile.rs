//! The portfolio owner's profile as consumed by the terminal.
//!
//! Profiles arrive from the remote profile source either complete or
//! degraded (`error == true` with a best-effort payload). Both render the
//! same way; the flag only changes what gets logged.

use serde::Deserialize;
use serde::Serialize;

use crate::config::IdentityConfig;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Profile {
    pub name: String,
    pub plain_name: String,
    pub about: String,
    pub github: String,
    pub linkedin: String,
    pub email: String,
    pub phone: String,
    pub avatar: String,
    pub location: String,
    pub website: String,
    pub bio: String,
    pub company: String,
    pub stats: ProfileStats,
    pub projects: Vec<Project>,
    pub skills: Skills,
    pub scraping_report: ScrapingReport,
    pub error: bool,
    pub error_message: Option<String>,
    pub last_updated: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileStats {
    pub repos: u64,
    pub followers: u64,
    pub following: u64,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Project {
    pub name: String,
    pub description: String,
    pub url: String,
    pub language: String,
    pub stars: u64,
    pub forks: u64,
    pub topics: Vec<String>,
    pub last_updated: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Skills {
    pub languages: Vec<String>,
    pub frameworks: Vec<String>,
    pub tools: Vec<String>,
    pub domains: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScrapingReport {
    pub timestamp: String,
    pub github_profile_scraped: bool,
    pub github_repos_scraped: bool,
    pub linkedin_scraped: bool,
    pub repositories_found: u64,
    pub data_sources: Vec<String>,
    pub limitations: Vec<String>,
    pub confidence: String,
}

impl Profile {
    /// Static profile built from configuration alone.
    pub fn from_identity(identity: &IdentityConfig) -> Self {
        let github = identity.github_url();
        Self {
            name: identity.name.clone(),
            plain_name: first_name(&identity.name),
            about: identity.about.clone(),
            github: github.clone(),
            linkedin: identity.linkedin_url.clone(),
            email: identity.email.clone(),
            phone: identity.phone.clone(),
            projects: vec![Project {
                name: "Visit My GitHub".to_string(),
                description: "Check out my repositories and projects on GitHub".to_string(),
                url: github,
                language: "Various".to_string(),
                ..Project::default()
            }],
            ..Self::default()
        }
    }

    pub fn display_name(&self) -> &str {
        if !self.name.trim().is_empty() {
            &self.name
        } else {
            &self.plain_name
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.error
    }
}

pub fn first_name(full: &str) -> String {
    full.split_whitespace().next().unwrap_or_default().to_string()
}
