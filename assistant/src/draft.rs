//! Draft event state being filled in across the conversation.

use serde::{Deserialize, Serialize};

/// Recurrence options for an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Recurrence {
    #[default]
    None,
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Recurrence {
    /// Parse a wire value, rejecting anything outside the fixed set.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "none" => Some(Self::None),
            "daily" => Some(Self::Daily),
            "weekly" => Some(Self::Weekly),
            "monthly" => Some(Self::Monthly),
            "yearly" => Some(Self::Yearly),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }
}

/// The event form the conversation is collaboratively filling in.
///
/// Every field is optional: a field is either set or not yet discussed.
/// Merging an update only touches the fields the update carries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DraftEvent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_datetime: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_datetime: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<Recurrence>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reminders: Option<Vec<i64>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl DraftEvent {
    /// Merge validated `update_event_details` arguments into the draft.
    ///
    /// Fields present in the arguments are overwritten; absent fields keep
    /// their current values. Arguments of the wrong shape are ignored here;
    /// the orchestrator has already validated and flagged them.
    pub fn apply_update(&mut self, arguments: &serde_json::Map<String, serde_json::Value>) {
        if let Some(v) = arguments.get("title").and_then(|v| v.as_str()) {
            self.title = Some(v.to_string());
        }
        if let Some(v) = arguments.get("start_datetime").and_then(|v| v.as_str()) {
            self.start_datetime = Some(v.to_string());
        }
        if let Some(v) = arguments.get("end_datetime").and_then(|v| v.as_str()) {
            self.end_datetime = Some(v.to_string());
        }
        if let Some(v) = arguments.get("description").and_then(|v| v.as_str()) {
            self.description = Some(v.to_string());
        }
        if let Some(v) = arguments.get("location").and_then(|v| v.as_str()) {
            self.location = Some(v.to_string());
        }
        if let Some(v) = arguments.get("amount").and_then(serde_json::Value::as_f64) {
            self.amount = Some(v);
        }
        if let Some(v) = arguments.get("category_id").and_then(|v| v.as_str()) {
            self.category_id = Some(v.to_string());
        }
        if let Some(v) = arguments
            .get("recurrence")
            .and_then(|v| v.as_str())
            .and_then(Recurrence::parse)
        {
            self.recurrence = Some(v);
        }
        if let Some(v) = arguments.get("reminders").and_then(|v| v.as_array()) {
            let minutes: Vec<i64> = v.iter().filter_map(serde_json::Value::as_i64).collect();
            self.reminders = Some(minutes);
        }
        if let Some(v) = arguments.get("color").and_then(|v| v.as_str()) {
            self.color = Some(v.to_string());
        }
    }

    /// Required fields still missing before the draft can be saved.
    pub fn missing_required_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.title.as_deref().is_none_or(str::is_empty) {
            missing.push("title");
        }
        if self.start_datetime.as_deref().is_none_or(str::is_empty) {
            missing.push("start_datetime");
        }
        missing
    }

    /// Whether the draft has everything required to be saved.
    pub fn is_complete(&self) -> bool {
        self.missing_required_fields().is_empty()
    }
}
