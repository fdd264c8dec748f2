use dlcpos_worker::config::WorkerConfig;
use dlcpos_worker::runner::Worker;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dlcpos_worker=debug,dlcpos_pipeline=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = WorkerConfig::from_env().expect("Invalid worker configuration");

    let pool = dlcpos_db::create_pool(&config.database_url)
        .await
        .expect("Failed to connect to database");
    dlcpos_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database connection established");

    dlcpos_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    tracing::info!(
        analysis_dir = %config.analysis_dir.display(),
        poll_interval_secs = config.poll_interval.as_secs(),
        run_once = config.run_once,
        "Worker starting",
    );

    let worker = Worker::new(pool, &config);
    if let Err(e) = worker.run(&config).await {
        tracing::error!(error = %e, "Worker stopped");
        std::process::exit(1);
    }
}
