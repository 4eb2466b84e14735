pub mod cli;
pub mod commands;
pub mod config;
pub mod helpers;
pub mod logging;

pub use studyplan_core as core;
pub use studyplan_core::model;
pub use studyplan_core::services;
pub use studyplan_core::views;

pub use studyplan_core::AppConfig;
