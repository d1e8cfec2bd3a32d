pub mod error;
pub mod models;
pub mod scope_path;
pub mod services;

pub use error::AppError;
pub use models::history::{MoveBatch, MoveHistory, MoveRecord};
pub use models::inventory::{FileCategory, InventoryEntry};
pub use models::plan::{MoveItem, Plan, PlanCategory};
