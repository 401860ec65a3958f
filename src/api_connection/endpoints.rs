use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct InlineData {
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    pub data: String,
}

/// One part of a content block: either text or inline image bytes.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(rename = "inlineData", skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<InlineData>,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            inline_data: None,
        }
    }

    pub fn inline_data(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            text: None,
            inline_data: Some(InlineData {
                mime_type: mime_type.into(),
                data: data.into(),
            }),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub parts: Vec<Part>,
}

impl Content {
    pub fn user(parts: Vec<Part>) -> Self {
        Self {
            role: Some("user".to_string()),
            parts,
        }
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: None,
            parts: vec![Part::text(text)],
        }
    }
}

/// Structured-output schema node. The API uses uppercase OpenAPI type names
/// ("OBJECT", "ARRAY", "STRING", "NUMBER").
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Schema {
    #[serde(rename = "type")]
    pub schema_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<HashMap<String, Schema>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
}

impl Schema {
    pub fn object(properties: HashMap<String, Schema>, required: Vec<String>) -> Self {
        Self {
            schema_type: "OBJECT".to_string(),
            description: None,
            properties: Some(properties),
            items: None,
            required: Some(required),
        }
    }

    pub fn array(items: Schema) -> Self {
        Self {
            schema_type: "ARRAY".to_string(),
            description: None,
            properties: None,
            items: Some(Box::new(items)),
            required: None,
        }
    }

    pub fn string(description: &str) -> Self {
        Self {
            schema_type: "STRING".to_string(),
            description: Some(description.to_string()),
            properties: None,
            items: None,
            required: None,
        }
    }

    pub fn number(description: &str) -> Self {
        Self {
            schema_type: "NUMBER".to_string(),
            description: Some(description.to_string()),
            properties: None,
            items: None,
            required: None,
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GenerationConfig {
    #[serde(rename = "responseMimeType", skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<String>,
    #[serde(rename = "responseSchema", skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<Schema>,
}

impl GenerationConfig {
    pub fn json_with_schema(schema: Schema) -> Self {
        Self {
            response_mime_type: Some("application/json".to_string()),
            response_schema: Some(schema),
        }
    }
}

#[derive(Debug, Serialize, Clone)]
pub struct GenerateContentRequest {
    #[serde(rename = "systemInstruction", skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    pub contents: Vec<Content>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Candidate {
    pub content: Option<Content>,
    #[serde(rename = "finishReason")]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

impl GenerateContentResponse {
    /// Text of the first candidate's first text part, if any.
    pub fn first_text(&self) -> Option<&str> {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .and_then(|content| content.parts.iter().find_map(|p| p.text.as_deref()))
    }
}
