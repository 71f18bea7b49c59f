//! Response envelope aggregating a command's reportable outcome.
//!
//! A producer creates an empty envelope, fills it (data, actions,
//! instructions, at most one error) and hands it upward read-only.
//! Nothing here touches storage; persisting artifacts is the job of
//! [`crate::results`].

use crate::errors::CommandError;
use crate::provider::DataProvider;
use crate::types::FlatData;
use serde::{Deserialize, Serialize};

/// Outcome of one logged step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    Success,
    Warning,
    Failure,
    Skipped,
}

impl ActionStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure)
    }
}

impl std::fmt::Display for ActionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Warning => write!(f, "warning"),
            Self::Failure => write!(f, "failure"),
            Self::Skipped => write!(f, "skipped"),
        }
    }
}

/// Human-readable action log entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionEntry {
    pub label: String,
    pub status: ActionStatus,
    pub detail: String,
}

impl ActionEntry {
    pub fn new(label: impl Into<String>, status: ActionStatus, detail: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            status,
            detail: detail.into(),
        }
    }
}

/// The envelope every command returns.
///
/// Once an error is set the command counts as failed, whatever data was
/// accumulated. Data may still be added afterwards as diagnostic context.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    data: FlatData,
    actions: Vec<ActionEntry>,
    instructions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<CommandError>,
}

impl ResponseEnvelope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a flat data entry.
    pub fn add_data(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.data.insert(key, value);
    }

    /// Append to the action log.
    pub fn add_action(
        &mut self,
        label: impl Into<String>,
        status: ActionStatus,
        detail: impl Into<String>,
    ) {
        self.actions.push(ActionEntry::new(label, status, detail));
    }

    /// Append an instruction for the downstream consumer.
    pub fn add_instruction(&mut self, text: impl Into<String>) {
        self.instructions.push(text.into());
    }

    /// Record the terminal error.
    ///
    /// Calling this twice is a caller bug: the last error wins and a warning
    /// is logged.
    pub fn set_error(&mut self, err: CommandError) {
        if let Some(previous) = &self.error {
            log::warn!(
                "Envelope error set twice; replacing '{}' with '{}'",
                previous,
                err
            );
        }
        self.error = Some(err);
    }

    /// Copy every entry of a flat map into the data (overwrite rule of `add_data`).
    pub fn merge<K, V>(&mut self, flat: impl IntoIterator<Item = (K, V)>)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.data.extend(flat);
    }

    /// Merge a provider's flat view.
    pub fn ingest(&mut self, provider: &dyn DataProvider) {
        self.merge(provider.to_flat_view());
    }

    pub fn data(&self) -> &FlatData {
        &self.data
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.data.get(key)
    }

    pub fn actions(&self) -> &[ActionEntry] {
        &self.actions
    }

    pub fn instructions(&self) -> &[String] {
        &self.instructions
    }

    pub fn error(&self) -> Option<&CommandError> {
        self.error.as_ref()
    }

    /// True iff no error was recorded.
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }

    /// Text stream for the downstream consumer.
    ///
    /// ```text
    /// key: value
    ///
    /// Actions:
    /// - [success] label: detail
    ///
    /// Instructions:
    /// - text
    ///
    /// Error: message. Try: ...
    /// ```
    ///
    /// Empty sections are left out.
    pub fn render(&self) -> String {
        let mut sections: Vec<String> = Vec::new();

        if !self.data.is_empty() {
            sections.push(
                self.data
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k, v))
                    .collect::<Vec<_>>()
                    .join("\n"),
            );
        }

        if !self.actions.is_empty() {
            let mut block = String::from("Actions:");
            for action in &self.actions {
                block.push_str(&format!(
                    "\n- [{}] {}: {}",
                    action.status, action.label, action.detail
                ));
            }
            sections.push(block);
        }

        if !self.instructions.is_empty() {
            let mut block = String::from("Instructions:");
            for instruction in &self.instructions {
                block.push_str(&format!("\n- {}", instruction));
            }
            sections.push(block);
        }

        if let Some(err) = &self.error {
            let mut block = err.to_consumer_message();
            for step in &err.recovery_instructions {
                block.push_str(&format!("\n- {}", step));
            }
            sections.push(block);
        }

        sections.join("\n\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorCode;

    #[test]
    fn test_envelope_starts_empty() {
        let env = ResponseEnvelope::new();
        assert!(env.data().is_empty());
        assert!(env.actions().is_empty());
        assert!(env.instructions().is_empty());
        assert!(env.is_success());
        assert_eq!(env.render(), "");
    }

    #[test]
    fn test_add_data_last_write_wins() {
        let mut env = ResponseEnvelope::new();
        env.add_data("owner", "acme");
        env.add_data("name", "widgets");
        env.add_data("owner", "acme-corp");

        assert_eq!(env.get("owner"), Some("acme-corp"));
        let keys: Vec<_> = env.data().keys().collect();
        assert_eq!(keys, vec!["owner", "name"]);
    }

    #[test]
    fn test_error_keeps_accumulated_state() {
        let mut env = ResponseEnvelope::new();
        env.add_data("owner", "acme");
        env.add_action("detect repository", ActionStatus::Success, "acme/widgets");
        env.add_instruction("Summarize the repository");
        let before = env.clone();

        env.set_error(CommandError::source_unavailable("github", "timeout"));

        assert!(env.is_failed());
        assert_eq!(env.data(), before.data());
        assert_eq!(env.actions(), before.actions());
        assert_eq!(env.instructions(), before.instructions());

        // Diagnostic data after the error is still accepted.
        env.add_data("http_status", "504");
        assert_eq!(env.get("http_status"), Some("504"));
        assert!(env.is_failed());
    }

    #[test]
    fn test_set_error_twice_keeps_last() {
        let mut env = ResponseEnvelope::new();
        env.set_error(CommandError::not_found("first"));
        env.set_error(CommandError::invalid_input("second"));
        assert_eq!(env.error().unwrap().code, ErrorCode::InvalidInput);
    }

    #[test]
    fn test_merge_flat_map() {
        let mut env = ResponseEnvelope::new();
        env.add_data("a", "1");
        env.merge(vec![("a", "2"), ("b", "3")]);
        assert_eq!(env.get("a"), Some("2"));
        assert_eq!(env.get("b"), Some("3"));
    }

    #[test]
    fn test_actions_append_only() {
        let mut env = ResponseEnvelope::new();
        env.add_action("fetch", ActionStatus::Success, "ok");
        env.add_action("fetch", ActionStatus::Failure, "retry failed");
        assert_eq!(env.actions().len(), 2);
        assert!(env.actions()[0].status.is_success());
        assert!(env.actions()[1].status.is_failure());
    }

    #[test]
    fn test_render() {
        let mut env = ResponseEnvelope::new();
        env.add_data("owner", "acme");
        env.add_action("save", ActionStatus::Skipped, "dry run");
        env.add_instruction("Describe the project");
        env.set_error(
            CommandError::storage("disk full").with_instruction("Free space in var/results"),
        );

        let text = env.render();
        assert!(text.starts_with("owner: acme\n\nActions:\n- [skipped] save: dry run"));
        assert!(text.contains("Instructions:\n- Describe the project"));
        assert!(text.contains("Error: disk full. Retry after 1000ms\n- Free space in var/results"));
    }

    #[test]
    fn test_envelope_serialization() {
        let mut env = ResponseEnvelope::new();
        env.add_data("owner", "acme");
        let json = serde_json::to_value(&env).unwrap();
        assert_eq!(json["data"]["owner"], "acme");
        assert!(json.get("error").is_none());

        let back: ResponseEnvelope = serde_json::from_value(json).unwrap();
        assert_eq!(back.get("owner"), Some("acme"));
    }
}
