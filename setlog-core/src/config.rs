use std::env;

use anyhow::{Context, Result};

/// Runtime configuration for one ETL deployment. Built once at startup and
/// injected into the coordinator; nothing reads the environment mid-run.
#[derive(Debug, Clone)]
pub struct EtlConfig {
    pub database_url: String,
    pub shared_secret: String,
}

impl EtlConfig {
    pub fn new(database_url: impl Into<String>, shared_secret: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            shared_secret: shared_secret.into(),
        }
    }

    pub fn from_env() -> Result<Self> {
        let database_url =
            env::var("DATABASE_URL").context("DATABASE_URL must be set in the environment")?;
        let shared_secret = env::var("SETLOG_SHARED_SECRET")
            .context("SETLOG_SHARED_SECRET must be set in the environment")?;
        Ok(Self::new(database_url, shared_secret))
    }
}
