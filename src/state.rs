use std::sync::Arc;

use crate::{
    config::AppConfig,
    db::{DbPool, OrmConn},
    services::{email::Mailer, storage::ObjectStorage},
};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub config: Arc<AppConfig>,
    pub mailer: Mailer,
    pub storage: ObjectStorage,
}

impl AppState {
    pub async fn from_config(config: AppConfig, pool: DbPool) -> anyhow::Result<Self> {
        let orm = crate::db::orm_from_pool(&pool);
        let mailer = Mailer::from_config(config.smtp.as_ref())?;
        let storage = ObjectStorage::from_config(&config.storage).await?;
        Ok(Self {
            pool,
            orm,
            config: Arc::new(config),
            mailer,
            storage,
        })
    }
}
