use std::fs;
use std::path::Path;

use tracing::info;

use crate::error::AppError;
use crate::models::inventory::{FileCategory, InventoryEntry};

/// Flat scan of the organizing root's immediate children. Directories are
/// inventoried as `folder` entries; files get their category from the
/// extension table. Sorted by relative path so downstream plan building is
/// deterministic.
pub fn scan(base: &Path) -> Result<Vec<InventoryEntry>, AppError> {
    let mut entries = Vec::new();
    for dir_entry in fs::read_dir(base)? {
        let dir_entry = dir_entry?;
        let relative_path = dir_entry.file_name().to_string_lossy().to_string();

        if dir_entry.file_type()?.is_dir() {
            entries.push(InventoryEntry {
                relative_path,
                extension: String::new(),
                category: FileCategory::Folder,
                is_folder: true,
            });
            continue;
        }

        let extension = Path::new(&relative_path)
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        let category = FileCategory::from_extension(&extension);
        entries.push(InventoryEntry {
            relative_path,
            extension,
            category,
            is_folder: false,
        });
    }

    entries.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    info!(path = %base.display(), entries = entries.len(), "scanned directory");
    Ok(entries)
}
