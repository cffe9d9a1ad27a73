use dotenvy::dotenv;
use family_wishlist::{
    config::{
        database::{create_connection, create_tables, get_database_url},
        settings::load_default_settings,
    },
    errors::Result,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Load application settings
    let settings = load_default_settings()
        .inspect_err(|e| error!("Failed to load settings: {e}"))?;
    info!(
        max_members = settings.families.max_members,
        membership_policy = ?settings.families.membership_policy,
        on_cancel = ?settings.reservations.on_cancel,
        "Loaded settings"
    );

    // 4. Connect and make sure the schema exists
    let database_url = get_database_url();
    let db = create_connection(&database_url)
        .await
        .inspect_err(|e| error!("Failed to connect to database: {e}"))?;
    create_tables(&db)
        .await
        .inspect(|_| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to initialize database: {e}"))?;

    info!("Family wishlist core ready");
    Ok(())
}
