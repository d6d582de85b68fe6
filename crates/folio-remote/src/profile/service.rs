use std::sync::Arc;

use chrono::DateTime;
use chrono::Utc;
use folio_core::first_name;
use folio_core::IdentityConfig;
use folio_core::Profile;
use folio_core::ProfileStats;
use folio_core::Project;
use folio_core::ScrapingReport;
use folio_core::Skills;
use sha2::Digest;
use sha2::Sha256;
use tokio::sync::Mutex;
use tracing::debug;
use tracing::info;
use tracing::warn;

use super::cache::CacheEntry;
use super::cache::ProfileCache;
use super::cache::PROFILE_CACHE_KEY;
use super::generator::languages_by_frequency;
use super::generator::project_from_repo;
use super::generator::ProfileGenerator;
use super::generator::ANY_LANGUAGE;
use super::generator::GITHUB_API_SOURCE;
use super::github::GithubClient;
use super::github::GithubRepo;

/// Width of one cache window.
pub const CACHE_BUCKET_MS: i64 = 3 * 60 * 60 * 1000;
const FALLBACK_PROJECTS: usize = 8;

/// Hex SHA-256 of `"{bucket}-{username}"`, where `bucket` counts whole
/// three-hour windows since the epoch.
pub fn cache_hash(username: &str, now: DateTime<Utc>) -> String {
    let bucket = now.timestamp_millis().div_euclid(CACHE_BUCKET_MS);
    format!("{:x}", Sha256::digest(format!("{bucket}-{username}").as_bytes()))
}

/// Serves the portfolio owner's profile. Never fails: upstream trouble
/// yields a degraded profile with `error` set.
pub struct ProfileService {
    github: GithubClient,
    generator: Arc<dyn ProfileGenerator>,
    identity: IdentityConfig,
    cache: Mutex<ProfileCache>,
}

impl ProfileService {
    pub fn new(
        github: GithubClient,
        generator: Arc<dyn ProfileGenerator>,
        identity: IdentityConfig,
        cache: ProfileCache,
    ) -> Self {
        Self {
            github,
            generator,
            identity,
            cache: Mutex::new(cache),
        }
    }

    pub async fn fetch_profile(&self, now: DateTime<Utc>) -> Profile {
        let username = self.identity.github_username.as_str();
        let hash = cache_hash(username, now);

        let mut cache = self.cache.lock().await;
        if let Some(profile) = cached_profile(&cache, &hash) {
            debug!("serving cached profile");
            return profile;
        }

        let repos = match self.github.fetch_repos(username).await {
            Ok(repos) => repos,
            Err(err) => {
                warn!(error = %err, "failed to fetch repositories");
                Vec::new()
            }
        };

        match self.generator.generate(&repos, now).await {
            Ok(profile) => {
                match serde_json::to_value(&profile) {
                    Ok(data) => {
                        let entry = CacheEntry {
                            key: PROFILE_CACHE_KEY.to_string(),
                            hash,
                            data,
                            updated_at: now,
                        };
                        if let Err(err) = cache.put(entry) {
                            warn!(error = %err, "failed to persist profile cache");
                        }
                    }
                    Err(err) => warn!(error = %err, "failed to encode profile for cache"),
                }
                info!(projects = profile.projects.len(), "profile generated");
                profile
            }
            Err(err) => {
                warn!(error = %err, "profile generation failed; using fallback");
                let repos = self.github.fetch_repos(username).await.unwrap_or_default();
                fallback_profile(&self.identity, &repos, &err.to_string(), now)
            }
        }
    }
}

fn cached_profile(cache: &ProfileCache, hash: &str) -> Option<Profile> {
    let entry = cache.get(PROFILE_CACHE_KEY).filter(|entry| entry.hash == hash)?;
    match serde_json::from_value::<Profile>(entry.data.clone()) {
        Ok(profile) => Some(profile),
        Err(err) => {
            warn!(error = %err, "discarding undecodable cached profile");
            None
        }
    }
}

/// Degraded profile built from configuration plus whatever repositories
/// could be fetched.
pub fn fallback_profile(
    identity: &IdentityConfig,
    repos: &[GithubRepo],
    error: &str,
    now: DateTime<Utc>,
) -> Profile {
    let github = identity.github_url();
    let projects = if repos.is_empty() {
        vec![Project {
            name: "Visit My GitHub".to_string(),
            description: "Check out my repositories and projects on GitHub".to_string(),
            url: github.clone(),
            language: ANY_LANGUAGE.to_string(),
            ..Project::default()
        }]
    } else {
        repos
            .iter()
            .take(FALLBACK_PROJECTS)
            .map(project_from_repo)
            .collect()
    };

    Profile {
        name: identity.name.clone(),
        plain_name: first_name(&identity.name),
        about: format!(
            "Hi there! I'm {}. Check out my GitHub for my latest work: {github}",
            identity.name
        ),
        github,
        linkedin: identity.linkedin_url.clone(),
        email: identity.email.clone(),
        phone: identity.phone.clone(),
        stats: ProfileStats {
            repos: repos.len() as u64,
            ..ProfileStats::default()
        },
        projects,
        skills: Skills {
            languages: languages_by_frequency(repos),
            ..Skills::default()
        },
        scraping_report: ScrapingReport {
            timestamp: now.to_rfc3339(),
            github_profile_scraped: false,
            github_repos_scraped: !repos.is_empty(),
            linkedin_scraped: false,
            repositories_found: repos.len() as u64,
            data_sources: if repos.is_empty() {
                Vec::new()
            } else {
                vec![GITHUB_API_SOURCE.to_string()]
            },
            limitations: vec![error.to_string()],
            confidence: "low".to_string(),
        },
        error: true,
        error_message: Some(error.to_string()),
        ..Profile::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RemoteError;
    use crate::error::RemoteResult;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;
    use wiremock::matchers::method;
    use wiremock::matchers::path;
    use wiremock::Mock;
    use wiremock::MockServer;
    use wiremock::ResponseTemplate;

    struct CountingGenerator {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl ProfileGenerator for CountingGenerator {
        async fn generate(&self, repos: &[GithubRepo], _now: DateTime<Utc>) -> RemoteResult<Profile> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(RemoteError::Generator("model unavailable".to_string()));
            }
            Ok(Profile {
                name: format!("generated from {} repos", repos.len()),
                ..Profile::default()
            })
        }
    }

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, hour, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    async fn github_with_repos(count: usize) -> MockServer {
        let server = MockServer::start().await;
        let repos: Vec<serde_json::Value> = (0..count)
            .map(|idx| {
                serde_json::json!({
                    "name": format!("repo-{idx}"),
                    "html_url": format!("https://github.com/octocat/repo-{idx}"),
                    "language": if idx % 2 == 0 { "Rust" } else { "Go" },
                })
            })
            .collect();
        Mock::given(method("GET"))
            .and(path("/users/octocat/repos"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                serde_json::Value::Array(repos).to_string(),
                "application/json",
            ))
            .mount(&server)
            .await;
        server
    }

    fn service(server: &MockServer, generator: Arc<CountingGenerator>) -> ProfileService {
        ProfileService::new(
            GithubClient::new(server.uri(), "folio-test"),
            generator,
            IdentityConfig::default(),
            ProfileCache::in_memory(),
        )
    }

    #[test]
    fn hash_is_stable_within_a_three_hour_window() {
        assert_eq!(cache_hash("octocat", at(0)), cache_hash("octocat", at(2)));
        assert_ne!(cache_hash("octocat", at(2)), cache_hash("octocat", at(3)));
        assert_ne!(cache_hash("octocat", at(0)), cache_hash("hubot", at(0)));
        assert_eq!(cache_hash("octocat", at(0)).len(), 64);
    }

    #[tokio::test]
    async fn generated_profile_is_cached_for_the_window() {
        let server = github_with_repos(3).await;
        let generator = Arc::new(CountingGenerator {
            calls: AtomicUsize::new(0),
            fail: false,
        });
        let service = service(&server, Arc::clone(&generator));

        let first = service.fetch_profile(at(0)).await;
        let second = service.fetch_profile(at(1)).await;
        assert_eq!(first.name, "generated from 3 repos");
        assert_eq!(first, second);
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);

        service.fetch_profile(at(3)).await;
        assert_eq!(generator.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn generator_failure_returns_degraded_profile() {
        let server = github_with_repos(10).await;
        let generator = Arc::new(CountingGenerator {
            calls: AtomicUsize::new(0),
            fail: true,
        });
        let service = service(&server, Arc::clone(&generator));

        let profile = service.fetch_profile(at(0)).await;
        assert!(profile.is_degraded());
        assert_eq!(
            profile.error_message.as_deref(),
            Some("profile generation failed: model unavailable")
        );
        assert_eq!(profile.projects.len(), FALLBACK_PROJECTS);
        assert_eq!(profile.skills.languages, vec!["Go", "Rust"]);
        assert_eq!(profile.scraping_report.confidence, "low");
        assert_eq!(profile.scraping_report.repositories_found, 10);

        // Failures are not cached.
        service.fetch_profile(at(0)).await;
        assert_eq!(generator.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn fallback_without_repos_points_at_github() {
        let profile = fallback_profile(&IdentityConfig::default(), &[], "offline", at(0));
        assert_eq!(profile.projects.len(), 1);
        assert_eq!(profile.projects[0].name, "Visit My GitHub");
        assert_eq!(profile.projects[0].url, "https://github.com/octocat");
        assert!(profile.scraping_report.data_sources.is_empty());
        assert!(!profile.scraping_report.github_repos_scraped);
    }
}
