use medicare_server::{
    appointment::repository::PostgresAppointmentRepository,
    build_router, database,
    doctor::repository::PostgresDoctorRepository,
    patient::repository::PostgresPatientRepository,
    user::repository::PostgresUserRepository,
    AppConfig, AppState,
};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "medicare_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting MediCare server");

    if let Err(e) = run(AppConfig::from_env()).await {
        error!(error = %e, "Server stopped with an error");
        std::process::exit(1);
    }
}

async fn run(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let app_state = match &config.database_url {
        Some(url) => {
            let pool = database::connect(url).await?;
            database::ensure_schema(&pool).await?;

            AppState::new(
                &config,
                Arc::new(PostgresUserRepository::new(pool.clone())),
                Arc::new(PostgresDoctorRepository::new(pool.clone())),
                Arc::new(PostgresPatientRepository::new(pool.clone())),
                Arc::new(PostgresAppointmentRepository::new(pool)),
            )
        }
        None => {
            warn!("DATABASE_URL not set, data will be kept in memory only");
            AppState::in_memory(&config)
        }
    };

    let app = build_router(app_state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    info!("Server running on http://localhost:{}", config.port);
    axum::serve(listener, app).await?;

    Ok(())
}
