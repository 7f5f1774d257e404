//! Wire types shared by both MCP transports: the JSON-schema shape used to
//! describe a tool's parameters, and the content blocks a call returns.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertySchema {
    #[serde(rename = "type")]
    pub property_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonSchema {
    #[serde(rename = "type")]
    pub schema_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<HashMap<String, PropertySchema>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
}

impl JsonSchema {
    pub fn object(properties: HashMap<String, PropertySchema>, required: Vec<String>) -> Self {
        JsonSchema {
            schema_type: "object".to_string(),
            properties: if properties.is_empty() {
                None
            } else {
                Some(properties)
            },
            required: if required.is_empty() {
                None
            } else {
                Some(required)
            },
        }
    }

    /// Overlays a parsed parameter description onto the matching property,
    /// if that property exists. Annotation keys with no matching signature
    /// parameter are silently dropped, matching the reference sandbox's
    /// merge behavior (iteration is driven by the schema's own properties,
    /// never by the annotation map).
    pub fn merge_descriptions(&mut self, annotations: &HashMap<String, String>) {
        if let Some(properties) = &mut self.properties {
            for (name, property) in properties.iter_mut() {
                if let Some(description) = annotations.get(name) {
                    property.description = Some(description.clone());
                }
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: JsonSchema,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Content {
    Text { text: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallResult {
    pub content: Vec<Content>,
    #[serde(rename = "isError")]
    pub is_error: bool,
}

impl ToolCallResult {
    pub fn ok(chunks: Vec<String>) -> Self {
        ToolCallResult {
            content: chunks.into_iter().map(|text| Content::Text { text }).collect(),
            is_error: false,
        }
    }

    pub fn error(message: String) -> Self {
        ToolCallResult {
            content: vec![Content::Text { text: message }],
            is_error: true,
        }
    }
}
