use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::EnvFilter;

use cohort_teams::application::TeamOrchestrationService;
use cohort_teams::commands::handle_line;
use cohort_teams::config::Config;
use cohort_teams::domain::notification::MessageNotificationService;
use cohort_teams::domain::repositories::{MemberRepository, TeamRepository};
use cohort_teams::domain::services::{RandomTeamSelector, TeamCompositionDomainService};
use cohort_teams::infrastructure::notifications::TracingNotificationRepository;
use cohort_teams::infrastructure::repositories::{
    InMemoryStorage, PostgresMemberRepository, PostgresTeamRepository,
};

#[tokio::main]
async fn main() {
    let config = Config::from_env().expect("Invalid configuration");

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let (teams, members): (Arc<dyn TeamRepository>, Arc<dyn MemberRepository>) =
        match &config.database_url {
            Some(database_url) => {
                tracing::info!("Connecting to database...");
                let pool = PgPoolOptions::new()
                    .max_connections(config.max_connections)
                    .connect(database_url)
                    .await
                    .expect("Failed to connect to database");

                sqlx::migrate!("./migrations")
                    .run(&pool)
                    .await
                    .expect("Failed to run migrations");

                tracing::info!("Database connected successfully");
                let teams: Arc<dyn TeamRepository> = Arc::new(PostgresTeamRepository::new(pool.clone()));
                let members: Arc<dyn MemberRepository> = Arc::new(PostgresMemberRepository::new(pool));
                (teams, members)
            }
            None => {
                tracing::warn!("DATABASE_URL not set, using in-memory storage");
                let storage = Arc::new(InMemoryStorage::new());
                let teams: Arc<dyn TeamRepository> = storage.clone();
                let members: Arc<dyn MemberRepository> = storage;
                (teams, members)
            }
        };

    let selector = match config.selector_seed {
        Some(seed) => RandomTeamSelector::seeded(seed),
        None => RandomTeamSelector::from_entropy(),
    };

    let service = TeamOrchestrationService::new(
        teams,
        members,
        Arc::new(MessageNotificationService::new(Arc::new(
            TracingNotificationRepository::new(),
        ))),
        TeamCompositionDomainService::new(Arc::new(selector)),
    );

    tracing::info!("Reading commands from stdin");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await.expect("Failed to read stdin") {
        if line.trim().is_empty() {
            continue;
        }

        let response = handle_line(&service, &line).await;
        stdout
            .write_all(format!("{}\n", response).as_bytes())
            .await
            .expect("Failed to write response");
        stdout.flush().await.expect("Failed to flush stdout");
    }

    tracing::info!("Input closed, shutting down");
}
