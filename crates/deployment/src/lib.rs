use async_trait::async_trait;
use db::DBService;
use services::services::{
    auth::SessionManager,
    category_directory::{CategoryDirectory, CategoryError},
    config::{Config, ConfigError},
    database_validator::{DatabaseValidationError, DatabaseValidator},
    prompt_repository::PromptRepository,
    study_guide::StudyGuide,
};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum DeploymentError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Category(#[from] CategoryError),
    #[error(transparent)]
    Validation(#[from] DatabaseValidationError),
}

/// Everything a request handler can reach.
#[async_trait]
pub trait Deployment: Clone + Send + Sync + 'static {
    async fn new() -> Result<Self, DeploymentError>;

    fn config(&self) -> &Config;

    fn db(&self) -> &DBService;

    fn categories(&self) -> &CategoryDirectory;

    fn prompts(&self) -> &PromptRepository;

    fn sessions(&self) -> &SessionManager;

    fn study_guide(&self) -> &StudyGuide;

    fn owner_id(&self) -> &str {
        &self.config().owner_id
    }

    /// Seeds the default categories and logs the schema check.
    async fn prepare(&self) -> Result<(), DeploymentError> {
        let result = DatabaseValidator::new(self.db().pool.clone()).validate().await?;
        if result.is_ok() {
            info!("{}", result.summary());
        } else {
            warn!("{}", result.summary());
        }

        self.categories().ensure_defaults().await?;
        Ok(())
    }
}
