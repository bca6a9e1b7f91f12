pub mod auth;
pub mod category_directory;
pub mod config;
pub mod database_validator;
pub mod levels;
pub mod permissions;
pub mod prompt_repository;
pub mod reconciler;
pub mod study_guide;
