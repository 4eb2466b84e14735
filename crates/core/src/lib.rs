pub mod config;
pub mod database;
pub mod model;
pub mod parser;
pub mod services;
pub mod storage;
pub mod store;
pub mod validation;
pub mod views;

pub use config::AppConfig;
pub use database::SqliteStorage;
pub use model::*;
pub use services::{Dashboard, ServiceError, TasksService};
pub use storage::{MemoryStorage, Storage, StorageError};
pub use store::{StoreError, TaskStore};
pub use validation::{Field, PatchDraft, TaskDraft, ValidationErrors};
