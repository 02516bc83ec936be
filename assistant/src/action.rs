//! The action vocabulary the model may request.
//!
//! Actions are declared to the model as function schemas with typed
//! parameters and allowed-value enumerations, so the model cannot emit
//! out-of-domain values undetected. The vocabulary is fixed: natural
//! language decides the *arguments* of an action, never whether an action
//! class exists.

use serde::{Deserialize, Serialize};

/// Event colors offered by the form.
pub const EVENT_COLORS: &[&str] = &[
    "#4F46E5", "#0EA5E9", "#10B981", "#F59E0B", "#EF4444", "#8B5CF6", "#EC4899", "#6B7280",
];

/// Recurrence options offered by the form.
pub const RECURRENCE_VALUES: &[&str] = &["none", "daily", "weekly", "monthly", "yearly"];

/// Reminder offsets (minutes before the event) offered by the form.
pub const REMINDER_MINUTES: &[i64] = &[0, 5, 10, 15, 30, 60, 120, 1440];

/// The fixed set of actions the assistant can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionName {
    /// Merge fields into the draft event form.
    UpdateEventDetails,

    /// Persist the draft and close the form.
    SaveAndCloseEvent,

    /// Run a semantic search over stored documents and events.
    SearchDocuments,

    /// Create a new document record.
    CreateDocument,

    /// Open an existing event by id.
    OpenEvent,

    /// Highlight the upload buttons in the UI.
    HighlightUploadButtons,
}

impl ActionName {
    /// Wire name as declared to the model.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UpdateEventDetails => "update_event_details",
            Self::SaveAndCloseEvent => "save_and_close_event",
            Self::SearchDocuments => "search_documents",
            Self::CreateDocument => "create_document",
            Self::OpenEvent => "open_event",
            Self::HighlightUploadButtons => "highlight_upload_buttons",
        }
    }
}

impl std::fmt::Display for ActionName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Parameter data types, in the model provider's schema vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamType {
    String,
    Number,
    Integer,
    Boolean,
    Array,
}

impl ParamType {
    /// Schema type string in the Gemini function-declaration format.
    pub fn schema_type(&self) -> &'static str {
        match self {
            Self::String => "STRING",
            Self::Number => "NUMBER",
            Self::Integer => "INTEGER",
            Self::Boolean => "BOOLEAN",
            Self::Array => "ARRAY",
        }
    }

    fn matches(&self, value: &serde_json::Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Number => value.is_number(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Boolean => value.is_boolean(),
            Self::Array => value.is_array(),
        }
    }
}

/// One declared parameter of an action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamSpec {
    /// Parameter name.
    pub name: String,

    /// Data type.
    pub param_type: ParamType,

    /// Description shown to the model.
    pub description: String,

    /// Whether the parameter is required.
    pub required: bool,

    /// Element type for array parameters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<ParamType>,

    /// Enumeration of allowed values (element values for arrays).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<serde_json::Value>>,
}

impl ParamSpec {
    /// Create a new required parameter.
    pub fn required(
        name: impl Into<String>,
        param_type: ParamType,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            param_type,
            description: description.into(),
            required: true,
            items: None,
            enum_values: None,
        }
    }

    /// Create a new optional parameter.
    pub fn optional(
        name: impl Into<String>,
        param_type: ParamType,
        description: impl Into<String>,
    ) -> Self {
        Self {
            required: false,
            ..Self::required(name, param_type, description)
        }
    }

    /// Set the element type for an array parameter.
    pub fn with_items(mut self, items: ParamType) -> Self {
        self.items = Some(items);
        self
    }

    /// Restrict the parameter (or array elements) to an allowed set.
    pub fn with_enum(mut self, values: Vec<serde_json::Value>) -> Self {
        self.enum_values = Some(values);
        self
    }

    /// Convert to a schema property in the provider's declaration format.
    pub fn to_schema(&self) -> serde_json::Value {
        let mut schema = serde_json::json!({
            "type": self.param_type.schema_type(),
            "description": self.description,
        });

        match (self.param_type, self.items) {
            (ParamType::Array, items) => {
                let mut item_schema = serde_json::json!({
                    "type": items.unwrap_or(ParamType::String).schema_type(),
                });
                if let Some(values) = &self.enum_values {
                    item_schema["enum"] = serde_json::json!(values);
                }
                schema["items"] = item_schema;
            }
            _ => {
                if let Some(values) = &self.enum_values {
                    schema["enum"] = serde_json::json!(values);
                }
            }
        }

        schema
    }

    /// Validate a model-emitted value against this parameter.
    ///
    /// Checks the type, and for enumerated parameters checks membership in
    /// the declared allow-list (per element, for arrays).
    pub fn validate(&self, value: &serde_json::Value) -> std::result::Result<(), String> {
        if !self.param_type.matches(value) {
            return Err(format!(
                "expected {}, got {value}",
                self.param_type.schema_type()
            ));
        }

        if let Some(allowed) = &self.enum_values {
            match value.as_array() {
                Some(elements) => {
                    for element in elements {
                        if !allowed.contains(element) {
                            return Err(format!("value {element} not in declared set"));
                        }
                    }
                }
                None => {
                    if !allowed.contains(value) {
                        return Err(format!("value {value} not in declared set"));
                    }
                }
            }
        }

        Ok(())
    }
}

/// A declared action: name, description, and parameter schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionDecl {
    /// Action name.
    pub name: ActionName,

    /// Description shown to the model.
    pub description: String,

    /// Declared parameters.
    pub params: Vec<ParamSpec>,
}

impl ActionDecl {
    /// Create a new declaration.
    pub fn new(name: ActionName, description: impl Into<String>) -> Self {
        Self {
            name,
            description: description.into(),
            params: Vec::new(),
        }
    }

    /// Add a parameter.
    pub fn with_param(mut self, param: ParamSpec) -> Self {
        self.params.push(param);
        self
    }

    /// Look up a declared parameter by name.
    pub fn param(&self, name: &str) -> Option<&ParamSpec> {
        self.params.iter().find(|p| p.name == name)
    }

    /// Render as a function declaration for the model provider.
    pub fn to_function_declaration(&self) -> serde_json::Value {
        let mut properties = serde_json::Map::new();
        let mut required = Vec::new();

        for param in &self.params {
            properties.insert(param.name.clone(), param.to_schema());
            if param.required {
                required.push(serde_json::Value::String(param.name.clone()));
            }
        }

        serde_json::json!({
            "name": self.name.as_str(),
            "description": self.description,
            "parameters": {
                "type": "OBJECT",
                "properties": properties,
                "required": required,
            }
        })
    }
}

/// An action the model actually requested.
///
/// The name is kept as raw text until validated: the model may emit a name
/// outside the vocabulary, which the orchestrator drops and flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionCall {
    /// Requested action name.
    pub name: String,

    /// Arguments as a name → value map.
    #[serde(default)]
    pub arguments: serde_json::Map<String, serde_json::Value>,
}

impl ActionCall {
    /// Create a call with no arguments.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: serde_json::Map::new(),
        }
    }

    /// Set an argument.
    pub fn with_arg(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.arguments.insert(name.into(), value);
        self
    }
}

/// Allowed values for the enumerated parameters of the current turn.
#[derive(Debug, Clone)]
pub struct AllowedValues {
    /// Category ids declared in the context.
    pub category_ids: Vec<String>,

    /// Color palette.
    pub colors: Vec<String>,

    /// Recurrence options.
    pub recurrence: Vec<String>,

    /// Reminder minute offsets.
    pub reminder_minutes: Vec<i64>,
}

impl Default for AllowedValues {
    fn default() -> Self {
        Self {
            category_ids: Vec::new(),
            colors: EVENT_COLORS.iter().map(ToString::to_string).collect(),
            recurrence: RECURRENCE_VALUES.iter().map(ToString::to_string).collect(),
            reminder_minutes: REMINDER_MINUTES.to_vec(),
        }
    }
}

fn string_values(values: &[String]) -> Vec<serde_json::Value> {
    values
        .iter()
        .map(|v| serde_json::Value::String(v.clone()))
        .collect()
}

/// Build the fixed action vocabulary for one turn.
///
/// Enumerated parameters embed the turn's allowed values so the model sees
/// exactly what it may emit.
pub fn action_vocabulary(allowed: &AllowedValues) -> Vec<ActionDecl> {
    let reminder_values: Vec<serde_json::Value> = allowed
        .reminder_minutes
        .iter()
        .map(|m| serde_json::json!(m))
        .collect();

    vec![
        ActionDecl::new(
            ActionName::UpdateEventDetails,
            "Aggiorna i dettagli dell'evento nel form di creazione",
        )
        .with_param(ParamSpec::optional(
            "title",
            ParamType::String,
            "Titolo evento",
        ))
        .with_param(ParamSpec::optional(
            "start_datetime",
            ParamType::String,
            "Data/ora inizio ISO 8601",
        ))
        .with_param(ParamSpec::optional(
            "end_datetime",
            ParamType::String,
            "Data/ora fine ISO 8601",
        ))
        .with_param(ParamSpec::optional(
            "description",
            ParamType::String,
            "Descrizione",
        ))
        .with_param(ParamSpec::optional(
            "location",
            ParamType::String,
            "Luogo",
        ))
        .with_param(ParamSpec::optional(
            "amount",
            ParamType::Number,
            "Importo in euro",
        ))
        .with_param(
            ParamSpec::optional("category_id", ParamType::String, "ID categoria")
                .with_enum(string_values(&allowed.category_ids)),
        )
        .with_param(
            ParamSpec::optional("recurrence", ParamType::String, "Ricorrenza")
                .with_enum(string_values(&allowed.recurrence)),
        )
        .with_param(
            ParamSpec::optional(
                "reminders",
                ParamType::Array,
                "Promemoria in minuti prima dell'evento",
            )
            .with_items(ParamType::Integer)
            .with_enum(reminder_values),
        )
        .with_param(
            ParamSpec::optional("color", ParamType::String, "Colore evento (hex)")
                .with_enum(string_values(&allowed.colors)),
        ),
        ActionDecl::new(
            ActionName::SaveAndCloseEvent,
            "Salva l'evento corrente e chiudi il form",
        ),
        ActionDecl::new(
            ActionName::SearchDocuments,
            "Cerca nei documenti ed eventi salvati dell'utente",
        )
        .with_param(ParamSpec::required(
            "query",
            ParamType::String,
            "Testo della ricerca",
        ))
        .with_param(
            ParamSpec::optional("source_types", ParamType::Array, "Filtra per tipo di fonte")
                .with_items(ParamType::String)
                .with_enum(vec![
                    serde_json::json!("document"),
                    serde_json::json!("event"),
                    serde_json::json!("conversation"),
                ]),
        ),
        ActionDecl::new(ActionName::CreateDocument, "Crea un nuovo documento")
            .with_param(ParamSpec::required(
                "title",
                ParamType::String,
                "Titolo del documento",
            ))
            .with_param(ParamSpec::optional(
                "content",
                ParamType::String,
                "Contenuto del documento",
            ))
            .with_param(
                ParamSpec::optional("document_type", ParamType::String, "Tipo di documento")
                    .with_enum(vec![
                        serde_json::json!("bolletta"),
                        serde_json::json!("fattura"),
                        serde_json::json!("multa"),
                        serde_json::json!("ricevuta"),
                        serde_json::json!("altro"),
                    ]),
            ),
        ActionDecl::new(ActionName::OpenEvent, "Apri un evento esistente").with_param(
            ParamSpec::required("event_id", ParamType::String, "ID dell'evento da aprire"),
        ),
        ActionDecl::new(
            ActionName::HighlightUploadButtons,
            "Evidenzia i pulsanti di caricamento documenti",
        ),
    ]
}
