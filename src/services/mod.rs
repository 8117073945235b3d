pub mod achievement_service;
pub mod completion_service;
pub mod progression;
pub mod schedule;
pub mod task_service;
pub mod user_service;

use std::sync::Arc;

use tokio::sync::Mutex;

/// Serializes read-modify-write cycles against one store within a process.
pub type WriteLock = Arc<Mutex<()>>;
