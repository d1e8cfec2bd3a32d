use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use crate::error::AppError;
use crate::models::inventory::InventoryEntry;
use crate::models::plan::Plan;
use crate::services::plan_service;

const SUGGEST_SYSTEM_PROMPT: &str =
    "You are a file organization assistant. Respond with clean JSON only.";
const REVISE_SYSTEM_PROMPT: &str = "You are a file organization assistant. You must create a \
     new organization scheme based on user feedback. Never return the same suggestion twice.";

const SUGGEST_TEMPERATURE: f32 = 0.2;
// Higher temperature for revisions so feedback produces real variation.
const REVISE_TEMPERATURE: f32 = 0.7;

/// Connection settings for an OpenAI-compatible chat completions endpoint.
#[derive(Debug, Clone)]
pub struct AiConfig {
    pub api_key: String,
    pub endpoint: String,
    pub model: String,
}

impl AiConfig {
    /// Read `API_KEY`, `ENDPOINT`, and `MODEL_NAME` from the environment.
    /// All three are required; otherwise the caller falls back to the
    /// deterministic plan.
    pub fn from_env() -> Option<Self> {
        let read = |name: &str| {
            std::env::var(name)
                .ok()
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        Some(Self {
            api_key: read("API_KEY")?,
            endpoint: read("ENDPOINT")?,
            model: read("MODEL_NAME")?,
        })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.endpoint.trim_end_matches('/'))
    }
}

fn inventory_paths(inventory: &[InventoryEntry]) -> serde_json::Value {
    json!(inventory
        .iter()
        .map(|entry| entry.relative_path.as_str())
        .collect::<Vec<_>>())
}

pub fn suggest_prompt(inventory: &[InventoryEntry]) -> String {
    format!(
        "Analyze these files and create an organized folder structure.\n\
         Files: {files}\n\n\
         Return a JSON object with categories as keys and arrays of file movements as values.\n\
         Each file movement should include 'original_path' and 'new_path'.\n\
         IMPORTANT: Always include both the folder and filename in the new_path.\n\n\
         Example format:\n\
         {{\n\
             \"documents\": [\n\
                 {{\"original_path\": \"file1.txt\", \"new_path\": \"documents/file1.txt\"}}\n\
             ],\n\
             \"images\": [\n\
                 {{\"original_path\": \"pic.jpg\", \"new_path\": \"images/pic.jpg\"}}\n\
             ]\n\
         }}",
        files = inventory_paths(inventory)
    )
}

pub fn revise_prompt(
    inventory: &[InventoryEntry],
    previous: &Plan,
    feedback: &str,
) -> String {
    format!(
        "I need you to reorganize these files differently based on user feedback.\n\n\
         Previous organization that needs modification:\n{previous}\n\n\
         Files to organize:\n{files}\n\n\
         User requested changes:\n{feedback}\n\n\
         Important instructions:\n\
         1. Create a NEW organization scheme that incorporates the user's feedback\n\
         2. Do NOT just return the previous suggestion\n\
         3. Ensure all new paths include both folder and filename\n\
         4. Return ONLY valid JSON mapping categories to arrays of \
         {{\"original_path\", \"new_path\"}} records",
        previous = serde_json::to_string_pretty(&previous.to_wire_json())
            .unwrap_or_else(|_| "{}".to_string()),
        files = inventory_paths(inventory),
    )
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageBody,
}

#[derive(Debug, Deserialize)]
struct ChatMessageBody {
    content: String,
}

async fn chat(
    config: &AiConfig,
    system_prompt: &str,
    user_prompt: &str,
    temperature: f32,
) -> Result<String, AppError> {
    let body = json!({
        "model": config.model,
        "temperature": temperature,
        "messages": [
            {"role": "system", "content": system_prompt},
            {"role": "user", "content": user_prompt},
        ],
    });

    let response = reqwest::Client::new()
        .post(config.completions_url())
        .bearer_auth(&config.api_key)
        .json(&body)
        .send()
        .await?
        .error_for_status()?
        .json::<ChatResponse>()
        .await?;

    let content = response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content)
        .ok_or_else(|| AppError::General("response contained no choices".to_string()))?;

    info!(chars = content.len(), "received plan response");
    Ok(content)
}

/// Ask the generator for a first organization proposal. Any transport or
/// shape error degrades to the deterministic fallback plan.
pub async fn request_plan(config: &AiConfig, inventory: &[InventoryEntry]) -> Plan {
    match chat(
        config,
        SUGGEST_SYSTEM_PROMPT,
        &suggest_prompt(inventory),
        SUGGEST_TEMPERATURE,
    )
    .await
    {
        Ok(raw) => plan_service::resolve_plan(&raw, inventory),
        Err(err) => {
            warn!(%err, "plan request failed, using fallback");
            plan_service::fallback_plan(inventory)
        }
    }
}

/// Ask for a revision incorporating user feedback. A generator that returns
/// the previous plan unchanged is treated as a failure: progress must never
/// silently stall, so the fallback plan is substituted.
pub async fn request_revised_plan(
    config: &AiConfig,
    inventory: &[InventoryEntry],
    previous: &Plan,
    feedback: &str,
) -> Plan {
    let revised = match chat(
        config,
        REVISE_SYSTEM_PROMPT,
        &revise_prompt(inventory, previous, feedback),
        REVISE_TEMPERATURE,
    )
    .await
    {
        Ok(raw) => plan_service::resolve_plan(&raw, inventory),
        Err(err) => {
            warn!(%err, "revision request failed, using fallback");
            return plan_service::fallback_plan(inventory);
        }
    };
    ensure_progress(revised, previous, inventory)
}

/// The no-op regeneration guard, separated from the transport so it can be
/// tested directly.
fn ensure_progress(revised: Plan, previous: &Plan, inventory: &[InventoryEntry]) -> Plan {
    if revised == *previous {
        warn!("generator repeated the previous plan, substituting fallback");
        return plan_service::fallback_plan(inventory);
    }
    revised
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::inventory::FileCategory;
    use crate::models::plan::{MoveItem, PlanCategory};

    fn entry(path: &str, ext: &str) -> InventoryEntry {
        InventoryEntry {
            relative_path: path.to_string(),
            extension: ext.to_string(),
            category: FileCategory::from_extension(ext),
            is_folder: false,
        }
    }

    fn plan_with(category: &str, original: &str, new: &str) -> Plan {
        Plan {
            categories: vec![PlanCategory {
                name: category.to_string(),
                items: vec![MoveItem {
                    original_path: original.to_string(),
                    new_path: new.to_string(),
                }],
            }],
        }
    }

    #[test]
    fn suggest_prompt_lists_inventory_paths() {
        let inventory = vec![entry("a.txt", "txt"), entry("b.jpg", "jpg")];
        let prompt = suggest_prompt(&inventory);
        assert!(prompt.contains("\"a.txt\""));
        assert!(prompt.contains("\"b.jpg\""));
        assert!(prompt.contains("original_path"));
    }

    #[test]
    fn revise_prompt_includes_previous_plan_and_feedback() {
        let inventory = vec![entry("a.txt", "txt")];
        let previous = plan_with("documents", "a.txt", "documents/a.txt");
        let prompt = revise_prompt(&inventory, &previous, "put everything under work/");
        assert!(prompt.contains("documents/a.txt"));
        assert!(prompt.contains("put everything under work/"));
    }

    #[test]
    fn repeated_plan_is_replaced_by_fallback() {
        let inventory = vec![entry("a.txt", "txt")];
        let previous = plan_with("documents", "a.txt", "documents/a.txt");
        let result = ensure_progress(previous.clone(), &previous, &inventory);
        assert_ne!(result, previous);
        assert_eq!(result, plan_service::fallback_plan(&inventory));
    }

    #[test]
    fn changed_plan_is_kept() {
        let inventory = vec![entry("a.txt", "txt")];
        let previous = plan_with("documents", "a.txt", "documents/a.txt");
        let revised = plan_with("work", "a.txt", "work/a.txt");
        let result = ensure_progress(revised.clone(), &previous, &inventory);
        assert_eq!(result, revised);
    }

    #[test]
    fn completions_url_tolerates_trailing_slash() {
        let config = AiConfig {
            api_key: "k".to_string(),
            endpoint: "https://api.example.com/v1/".to_string(),
            model: "gpt-test".to_string(),
        };
        assert_eq!(
            config.completions_url(),
            "https://api.example.com/v1/chat/completions"
        );
    }
}
