//! The portfolio owner's profile: GitHub data, generation, caching.

mod cache;
mod generator;
mod github;
mod service;

pub use cache::CacheEntry;
pub use cache::ProfileCache;
pub use cache::PROFILE_CACHE_KEY;
pub use generator::GithubProfileGenerator;
pub use generator::ProfileGenerator;
pub use github::GithubClient;
pub use github::GithubRepo;
pub use github::GithubUser;
pub use service::cache_hash;
pub use service::fallback_profile;
pub use service::ProfileService;
pub use service::CACHE_BUCKET_MS;
