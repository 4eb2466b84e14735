pub use studyplan_cli::cli;
pub use studyplan_cli::commands;
pub use studyplan_cli::config;
pub use studyplan_cli::logging;
pub use studyplan_cli::AppConfig;

pub use studyplan_core as core;
pub use studyplan_core::model;
pub use studyplan_core::services;
pub use studyplan_core::store;
pub use studyplan_core::views;
