use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

// generateContent wire types

#[derive(Debug, Serialize)]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    pub generationConfig: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Content {
    pub parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Part {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct GenerationConfig {
    pub responseMimeType: String,
    pub responseSchema: Value,
}

impl GenerateContentRequest {
    /// Build a request that constrains the service to emit JSON matching
    /// the structured answer schema instead of free text.
    pub fn structured(prompt: String) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            generationConfig: GenerationConfig {
                responseMimeType: "application/json".to_string(),
                responseSchema: response_schema(),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    pub content: Option<Content>,
}

impl GenerateContentResponse {
    /// Text of the first candidate part, if the service produced one.
    pub fn first_text(&self) -> Option<&str> {
        self.candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .first()
            .map(|p| p.text.as_str())
    }
}

/// Output schema sent with every request. Field names and the three-valued
/// related-item kind must stay in lockstep with the types in `crate::chat`.
pub fn response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "intro": {
                "type": "STRING",
                "description": "A short introductory paragraph answering the query."
            },
            "sections": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "content": {
                            "type": "STRING",
                            "description": "A detailed point or section. You can use HTML <span> tags with Tailwind classes like <span class='font-bold text-gray-900'> for emphasis."
                        }
                    }
                }
            },
            "related": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "title": { "type": "STRING" },
                        "type": {
                            "type": "STRING",
                            "description": "Must be one of: 'Learn more', 'Download brochure', 'Case study'"
                        },
                        "image": {
                            "type": "STRING",
                            "description": "A relevant Unsplash image URL, e.g., https://images.unsplash.com/photo-..."
                        },
                        "url": {
                            "type": "STRING",
                            "description": "A relevant URL from the provided website content."
                        }
                    }
                }
            },
            "suggestions": {
                "type": "ARRAY",
                "items": { "type": "STRING" },
                "description": "3 follow-up questions the user can ask."
            }
        },
        "required": ["intro", "sections", "related", "suggestions"]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_carries_schema_and_mime_type() {
        let req = GenerateContentRequest::structured("prompt text".to_string());
        let json = serde_json::to_value(&req).unwrap();

        assert_eq!(json["contents"][0]["parts"][0]["text"], "prompt text");
        assert_eq!(
            json["generationConfig"]["responseMimeType"],
            "application/json"
        );
        let required = &json["generationConfig"]["responseSchema"]["required"];
        assert_eq!(
            required,
            &json!(["intro", "sections", "related", "suggestions"])
        );
    }

    #[test]
    fn first_text_walks_the_candidate_shape() {
        let payload: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"{\"intro\":\"hi\"}"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(payload.first_text(), Some("{\"intro\":\"hi\"}"));

        let empty: GenerateContentResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(empty.first_text(), None);
    }
}
