use std::collections::HashMap;

use async_trait::async_trait;
use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use folio_core::first_name;
use folio_core::IdentityConfig;
use folio_core::Profile;
use folio_core::ProfileStats;
use folio_core::Project;
use folio_core::ScrapingReport;
use folio_core::Skills;

use super::github::GithubClient;
use super::github::GithubRepo;
use super::github::GithubUser;
use crate::error::RemoteError;
use crate::error::RemoteResult;

const MAX_PROJECTS: usize = 20;
const ACTIVE_WINDOW_DAYS: i64 = 183;
pub(crate) const NO_DESCRIPTION: &str = "No description provided.";
pub(crate) const ANY_LANGUAGE: &str = "Various";
pub(crate) const GITHUB_API_SOURCE: &str = "GitHub API";

/// Produces a full profile from the repository list fetched beforehand.
#[async_trait]
pub trait ProfileGenerator: Send + Sync {
    async fn generate(&self, repos: &[GithubRepo], now: DateTime<Utc>) -> RemoteResult<Profile>;
}

/// Builds the profile from the GitHub user record plus repositories.
pub struct GithubProfileGenerator {
    github: GithubClient,
    identity: IdentityConfig,
}

impl GithubProfileGenerator {
    pub fn new(github: GithubClient, identity: IdentityConfig) -> Self {
        Self { github, identity }
    }
}

#[async_trait]
impl ProfileGenerator for GithubProfileGenerator {
    async fn generate(&self, repos: &[GithubRepo], now: DateTime<Utc>) -> RemoteResult<Profile> {
        let user = self
            .github
            .fetch_user(&self.identity.github_username)
            .await
            .map_err(|err| RemoteError::Generator(err.to_string()))?;
        Ok(build_profile(&self.identity, &user, repos, now))
    }
}

pub(crate) fn build_profile(
    identity: &IdentityConfig,
    user: &GithubUser,
    repos: &[GithubRepo],
    now: DateTime<Utc>,
) -> Profile {
    let name = non_blank(user.name.as_deref()).unwrap_or(&identity.name).to_string();
    let projects = repos
        .iter()
        .filter(|repo| !repo.fork)
        .take(MAX_PROJECTS)
        .map(|repo| Project {
            is_active: Some(is_active(repo, now)),
            ..project_from_repo(repo)
        })
        .collect();

    Profile {
        plain_name: first_name(&name),
        name,
        about: non_blank(user.bio.as_deref())
            .unwrap_or(&identity.about)
            .to_string(),
        github: if user.html_url.is_empty() {
            identity.github_url()
        } else {
            user.html_url.clone()
        },
        linkedin: identity.linkedin_url.clone(),
        email: non_blank(user.email.as_deref())
            .unwrap_or(&identity.email)
            .to_string(),
        phone: identity.phone.clone(),
        avatar: user.avatar_url.clone(),
        location: user.location.clone().unwrap_or_default(),
        website: user.blog.clone().unwrap_or_default(),
        bio: user.bio.clone().unwrap_or_default(),
        company: user.company.clone().unwrap_or_default(),
        stats: ProfileStats {
            repos: user.public_repos,
            followers: user.followers,
            following: user.following,
            created_at: user.created_at.clone(),
        },
        projects,
        skills: Skills {
            languages: languages_by_frequency(repos),
            ..Skills::default()
        },
        scraping_report: ScrapingReport {
            timestamp: now.to_rfc3339(),
            github_profile_scraped: true,
            github_repos_scraped: !repos.is_empty(),
            linkedin_scraped: false,
            repositories_found: repos.len() as u64,
            data_sources: vec![GITHUB_API_SOURCE.to_string()],
            limitations: vec!["LinkedIn profile is not scraped".to_string()],
            confidence: "medium".to_string(),
        },
        error: false,
        error_message: None,
        last_updated: Some(now.to_rfc3339()),
    }
}

pub(crate) fn project_from_repo(repo: &GithubRepo) -> Project {
    Project {
        name: repo.name.clone(),
        description: non_blank(repo.description.as_deref())
            .unwrap_or(NO_DESCRIPTION)
            .to_string(),
        url: repo.html_url.clone(),
        language: non_blank(repo.language.as_deref())
            .unwrap_or(ANY_LANGUAGE)
            .to_string(),
        stars: repo.stargazers_count,
        forks: repo.forks_count,
        topics: repo.topics.clone(),
        last_updated: repo.updated_at.clone(),
        is_active: None,
    }
}

/// Distinct repository languages, most used first, ties by name.
pub(crate) fn languages_by_frequency(repos: &[GithubRepo]) -> Vec<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for language in repos.iter().filter_map(|repo| non_blank(repo.language.as_deref())) {
        *counts.entry(language).or_default() += 1;
    }
    let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
    ranked.sort_by(|(a_name, a_count), (b_name, b_count)| {
        b_count.cmp(a_count).then_with(|| a_name.cmp(b_name))
    });
    ranked
        .into_iter()
        .map(|(language, _)| language.to_string())
        .collect()
}

fn is_active(repo: &GithubRepo, now: DateTime<Utc>) -> bool {
    repo.pushed_at
        .as_deref()
        .or(repo.updated_at.as_deref())
        .and_then(|stamp| DateTime::parse_from_rfc3339(stamp).ok())
        .is_some_and(|pushed| now.signed_duration_since(pushed) <= Duration::days(ACTIVE_WINDOW_DAYS))
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.trim().is_empty())
}
