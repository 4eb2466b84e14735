pub mod tasks;

pub use tasks::{Dashboard, ServiceError, TasksService};
