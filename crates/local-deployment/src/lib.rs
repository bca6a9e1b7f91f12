use std::sync::Arc;

use async_trait::async_trait;
use db::DBService;
use deployment::{Deployment, DeploymentError};
use services::services::{
    auth::SessionManager, category_directory::CategoryDirectory, config::Config,
    prompt_repository::PromptRepository, study_guide::StudyGuide,
};
use tracing::info;

#[derive(Clone)]
pub struct LocalDeployment {
    config: Arc<Config>,
    db: DBService,
    categories: CategoryDirectory,
    prompts: PromptRepository,
    sessions: SessionManager,
    study_guide: StudyGuide,
}

impl LocalDeployment {
    /// Opens the configured database and wires every service to it.
    pub async fn from_config(config: Config) -> Result<Self, DeploymentError> {
        let db = DBService::new(&config.database_url).await?;
        Self::with_db(config, db).await
    }

    /// Wires the services to an already opened database.
    pub async fn with_db(config: Config, db: DBService) -> Result<Self, DeploymentError> {
        let categories = CategoryDirectory::new(db.pool.clone());
        let prompts = PromptRepository::new(db.pool.clone(), config.owner_id.clone(), categories.clone());
        let sessions = SessionManager::from_config(&config);
        let study_guide = StudyGuide::new(config.content_dir.clone());

        let deployment = Self {
            config: Arc::new(config),
            db,
            categories,
            prompts,
            sessions,
            study_guide,
        };
        deployment.prepare().await?;
        info!(
            owner_id = %deployment.config.owner_id,
            content_dir = %deployment.config.content_dir.display(),
            "Local deployment ready"
        );
        Ok(deployment)
    }
}

#[async_trait]
impl Deployment for LocalDeployment {
    async fn new() -> Result<Self, DeploymentError> {
        let config = Config::from_env()?;
        Self::from_config(config).await
    }

    fn config(&self) -> &Config {
        &self.config
    }

    fn db(&self) -> &DBService {
        &self.db
    }

    fn categories(&self) -> &CategoryDirectory {
        &self.categories
    }

    fn prompts(&self) -> &PromptRepository {
        &self.prompts
    }

    fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    fn study_guide(&self) -> &StudyGuide {
        &self.study_guide
    }
}

#[cfg(test)]
mod tests {
    use services::services::config::hash_password;
    use tempfile::TempDir;

    use super::*;

    #[tokio::test]
    async fn file_database_is_created_and_seeded() {
        let dir = TempDir::new().unwrap();
        let config = Config {
            database_url: format!("sqlite://{}", dir.path().join("library.db").display()),
            host: "127.0.0.1".to_string(),
            port: 0,
            content_dir: dir.path().join("content"),
            owner_id: "user-test".to_string(),
            admin_password_hash: Some(hash_password("pw")),
            session_secret: b"secret".to_vec(),
        };

        let deployment = LocalDeployment::from_config(config).await.unwrap();
        assert_eq!(deployment.owner_id(), "user-test");
        assert_eq!(deployment.categories().snapshot().await.categories.len(), 5);
        assert!(deployment.study_guide().list_chapters().await.is_empty());
    }
}
