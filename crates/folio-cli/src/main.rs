mod config;
mod effects;
mod logging;
mod ui;

use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::Arc;

use clap::Parser;
use folio_core::Config;
use folio_core::TerminalState;
use folio_remote::profile::GithubClient;
use folio_remote::profile::GithubProfileGenerator;
use folio_remote::profile::ProfileCache;
use folio_remote::profile::ProfileService;
use folio_remote::sandbox::ProcessSandboxProvider;
use folio_remote::sandbox::SandboxManager;
use folio_remote::sandbox::SandboxManagerOptions;
use folio_remote::sandbox::SandboxService;
use folio_remote::sandbox::SessionRegistry;
use folio_remote::AdviceClient;
use tracing::info;

use crate::effects::EffectRunner;

/// A terminal-styled personal portfolio.
#[derive(Debug, Parser)]
#[command(name = "folio", version)]
struct Cli {
    /// Config file (default: ~/.folio/config.toml).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log at info level instead of warn.
    #[arg(long)]
    debug: bool,

    /// Skip profile fetching and show the configured identity only.
    #[arg(long)]
    offline: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = config::load_config(cli.config.as_deref())?;
    if cli.offline {
        config.services.offline = true;
    }

    let _log_guard = logging::init_file_logging(&config::folio_home()?.join("log"), cli.debug)?;
    info!(offline = config.services.offline, "starting folio");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let (tx, rx) = mpsc::channel();
    let (manager, runner) = {
        let _enter = runtime.enter();
        let manager = Arc::new(SandboxManager::new(
            Arc::new(ProcessSandboxProvider::new(&config.sandbox)),
            Arc::new(SessionRegistry::new()),
            SandboxManagerOptions::from(&config.sandbox),
        ));
        let runner = EffectRunner::new(
            runtime.handle().clone(),
            tx.clone(),
            SandboxService::new(Arc::clone(&manager)),
            AdviceClient::new(config.services.advice_url.clone()),
        );
        (manager, runner)
    };

    if !config.services.offline {
        let service = profile_service(&config)?;
        effects::spawn_profile_fetch(runtime.handle(), Arc::new(service), tx);
    }

    let result = ui::run(TerminalState::new(&config), runner, rx);

    runtime.block_on(manager.shutdown());
    info!("folio exited");
    result
}

fn profile_service(config: &Config) -> anyhow::Result<ProfileService> {
    let github = GithubClient::new(
        config.services.github_api_base.clone(),
        config.services.user_agent.clone(),
    );
    let generator = GithubProfileGenerator::new(github.clone(), config.identity.clone());
    Ok(ProfileService::new(
        github,
        Arc::new(generator),
        config.identity.clone(),
        ProfileCache::open(config::profile_cache_path(config)?),
    ))
}
