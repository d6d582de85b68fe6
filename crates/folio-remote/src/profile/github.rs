use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use crate::error::RemoteError;
use crate::error::RemoteResult;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GithubUser {
    pub login: String,
    pub name: Option<String>,
    pub bio: Option<String>,
    pub email: Option<String>,
    pub avatar_url: String,
    pub html_url: String,
    pub location: Option<String>,
    pub blog: Option<String>,
    pub company: Option<String>,
    pub public_repos: u64,
    pub followers: u64,
    pub following: u64,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GithubRepo {
    pub name: String,
    pub description: Option<String>,
    pub html_url: String,
    pub language: Option<String>,
    pub stargazers_count: u64,
    pub forks_count: u64,
    pub topics: Vec<String>,
    pub updated_at: Option<String>,
    pub pushed_at: Option<String>,
    pub fork: bool,
}

/// Minimal read-only GitHub REST client.
#[derive(Debug, Clone)]
pub struct GithubClient {
    client: reqwest::Client,
    api_base: String,
    user_agent: String,
}

impl GithubClient {
    pub fn new(api_base: impl Into<String>, user_agent: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(20))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            api_base: api_base.into(),
            user_agent: user_agent.into(),
        }
    }

    pub async fn fetch_user(&self, username: &str) -> RemoteResult<GithubUser> {
        let url = format!("{}/users/{username}", self.base());
        self.get_json(&url).await
    }

    /// Most recently updated repositories first, up to 100.
    pub async fn fetch_repos(&self, username: &str) -> RemoteResult<Vec<GithubRepo>> {
        let url = format!(
            "{}/users/{username}/repos?sort=updated&per_page=100",
            self.base()
        );
        let repos: Vec<GithubRepo> = self.get_json(&url).await?;
        debug!(count = repos.len(), "fetched github repositories");
        Ok(repos)
    }

    fn base(&self) -> &str {
        self.api_base.trim_end_matches('/')
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> RemoteResult<T> {
        let resp = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(RemoteError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        resp.json::<T>()
            .await
            .map_err(|err| RemoteError::Decode(err.to_string()))
    }
}
