pub mod ai_service;
pub mod organize_service;
pub mod plan_service;
pub mod scan_service;
pub mod undo_service;
