use std::sync::Arc;

use clap::Parser;

use deskbot::bot::Bot;
use deskbot::cli::Cli;
use deskbot::config::{ConfigLoader, Environment};
use deskbot::db::{bootstrap, establish_pool};
use deskbot::dispatch::Dispatcher;
use deskbot::external::ErpClient;
use deskbot::gateway::TelegramGateway;
use deskbot::jobs::{self, Scheduler};
use deskbot::menu::MenuTree;
use deskbot::repositories::Repositories;
use deskbot::services::Services;
use deskbot::sessions::DutySessions;
use deskbot::{AppState, logger};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let loader = match &cli.config_dir {
        Some(dir) => ConfigLoader::with_dir(dir.clone()),
        None => ConfigLoader::new(),
    };
    let mut settings = loader.load()?;
    if let Some(level) = cli.log_level {
        settings.logger.level = level;
    }

    logger::init(&settings.logger)?;
    tracing::info!(
        app_name = %settings.application.name,
        environment = %Environment::from_env(),
        "Application starting"
    );

    // Store initialization is the only fatal path.
    let pool = establish_pool(&settings.database)?;
    bootstrap::ensure_schema(&pool).await?;
    tracing::info!(path = %settings.database.path, "Store ready");

    let gateway = Arc::new(TelegramGateway::new(&settings.telegram)?);
    let erp = Arc::new(ErpClient::new(&settings.erp)?);
    let sessions = Arc::new(DutySessions::new());

    let repositories = Repositories::new(pool);
    let services = Services::new(repositories, gateway.clone(), erp, sessions, &settings);

    let mut scheduler = None;
    if settings.jobs.enabled {
        let sched = Scheduler::new().await?;
        jobs::register_standard_jobs(&sched, &services, &settings, gateway.clone()).await?;
        sched.start().await?;
        scheduler = Some(sched);
        tracing::info!("Job scheduler started");
    } else {
        tracing::warn!("Background jobs are disabled by configuration");
    }

    let state = AppState::new(gateway.clone(), settings.telegram.dev_chat_id);
    let dispatcher = Arc::new(Dispatcher::new(
        services,
        Arc::new(MenuTree::standard()),
        gateway.clone(),
    ));

    let bot = Bot::new(state, dispatcher, gateway, settings.telegram.poll_timeout);
    bot.run().await?;

    if let Some(mut sched) = scheduler {
        sched.shutdown().await?;
    }
    tracing::info!("Shutdown complete");
    Ok(())
}
