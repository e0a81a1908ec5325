use std::sync::Arc;

use anyhow::Context;
use sqlx::PgPool;

use crate::config::cors::CorsConfig;
use crate::config::database::init_db_pool;
use crate::config::gate::GateConfig;
use crate::config::jwt::JwtConfig;
use crate::middleware::gate::PathClassifier;

#[derive(Clone, Debug)]
pub struct AppState {
    pub db: PgPool,
    pub jwt_config: JwtConfig,
    pub cors_config: CorsConfig,
    pub classifier: Arc<PathClassifier>,
}

impl AppState {
    pub fn new(
        db: PgPool,
        jwt_config: JwtConfig,
        cors_config: CorsConfig,
        gate_config: &GateConfig,
    ) -> Self {
        Self {
            db,
            jwt_config,
            cors_config,
            classifier: Arc::new(PathClassifier::new(gate_config)),
        }
    }
}

pub async fn init_app_state() -> anyhow::Result<AppState> {
    let db = init_db_pool().await?;
    sqlx::migrate!("./migrations")
        .run(&db)
        .await
        .context("Failed to run database migrations")?;
    let jwt_config = JwtConfig::from_env()?;
    let cors_config = CorsConfig::from_env();
    let gate_config = GateConfig::from_env();

    Ok(AppState::new(db, jwt_config, cors_config, &gate_config))
}
