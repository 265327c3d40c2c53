use axum_helpers::JwtAuth;
use axum_helpers::server::{create_production_app, health_router};
use core_config::tracing::{init_tracing, install_color_eyre};
use domain_notifications::{EmailProvider, InMemoryEmailProvider, NotificationService, SmtpProvider};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

mod api;
mod config;
mod openapi;
mod state;

use config::{Config, MailBackend};
use state::AppState;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Before any fallible operation so startup errors are colored
    install_color_eyre();

    let config = Config::from_env()?;
    init_tracing(&config.environment);

    let db = database::postgres::connect_from_config_with_retry(config.database.clone(), None)
        .await
        .map_err(|e| eyre::eyre!("PostgreSQL connection failed: {}", e))?;

    if config.retail.run_migrations {
        database::postgres::run_migrations::<migration::Migrator>(&db, config.app.name)
            .await
            .map_err(|e| eyre::eyre!("Migrations failed: {}", e))?;
    }

    let provider: Arc<dyn EmailProvider> = match config.mail {
        MailBackend::Smtp => Arc::new(
            SmtpProvider::new(config.smtp.clone())
                .map_err(|e| eyre::eyre!("Failed to configure SMTP: {}", e))?,
        ),
        MailBackend::Memory => {
            tracing::warn!("MAIL_BACKEND=memory: outgoing mail is kept in memory only");
            Arc::new(InMemoryEmailProvider::new())
        }
    };
    let notifications = NotificationService::new(provider)
        .map_err(|e| eyre::eyre!("Failed to load email templates: {}", e))?;

    let jwt = JwtAuth::new(&config.jwt);

    let state = AppState {
        config,
        db,
        jwt,
        notifications,
    };

    let api_routes = api::routes(&state)?;

    // docs, CORS, tracing and the /api prefix
    let router = axum_helpers::create_router::<openapi::ApiDoc>(api_routes)?;

    let app = router
        .merge(health_router(state.config.app))
        .merge(api::ready_router(state.clone()));

    info!(
        base_url = %state.config.retail.public_base_url,
        operator_email = ?state.config.retail.operator_email,
        "Starting retail API"
    );

    create_production_app(
        app,
        &state.config.server,
        Duration::from_secs(30),
        async move {
            info!("Shutting down: closing database connections");
            match state.db.close().await {
                Ok(_) => info!("PostgreSQL connection closed successfully"),
                Err(e) => tracing::error!("Error closing PostgreSQL: {}", e),
            }
        },
    )
    .await
    .map_err(|e| eyre::eyre!("Server error: {}", e))?;

    info!("Retail API shutdown complete");
    Ok(())
}
