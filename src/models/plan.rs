use serde::{Deserialize, Serialize};

/// A single proposed move, both paths relative to the organizing root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveItem {
    pub original_path: String,
    pub new_path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanCategory {
    pub name: String,
    pub items: Vec<MoveItem>,
}

/// A validated reorganization proposal. Categories keep the order in which
/// the supplier emitted them; execution follows that order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub categories: Vec<PlanCategory>,
}

impl Plan {
    pub fn is_empty(&self) -> bool {
        self.categories.iter().all(|category| category.items.is_empty())
    }

    pub fn item_count(&self) -> usize {
        self.categories.iter().map(|category| category.items.len()).sum()
    }

    /// Render back to the wire shape: a JSON object keyed by category name,
    /// each value an array of `{original_path, new_path}` records. Used for
    /// display and for the revision prompt.
    pub fn to_wire_json(&self) -> serde_json::Value {
        let mut root = serde_json::Map::new();
        for category in &self.categories {
            let items = category
                .items
                .iter()
                .map(|item| {
                    serde_json::json!({
                        "original_path": item.original_path,
                        "new_path": item.new_path,
                    })
                })
                .collect();
            root.insert(category.name.clone(), serde_json::Value::Array(items));
        }
        serde_json::Value::Object(root)
    }
}
