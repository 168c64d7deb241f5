use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Bot,
}

/// One turn in the conversation log. Immutable once appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub role: Role,
    /// Plain-text content; for bot messages this mirrors the answer intro.
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structured: Option<StructuredResponse>,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: Role::User,
            content: content.into(),
            structured: None,
            timestamp: Utc::now(),
        }
    }

    pub fn bot(answer: StructuredResponse) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: Role::Bot,
            content: answer.intro.clone(),
            structured: Some(answer),
            timestamp: Utc::now(),
        }
    }
}

/// The schema-conforming answer payload rendered by the widget.
///
/// The remote service is asked for exactly this shape; the canned generator
/// produces it directly. Array fields missing from a payload deserialize as
/// empty so a sparse answer still renders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredResponse {
    pub intro: String,
    #[serde(default)]
    pub sections: Vec<Section>,
    #[serde(default)]
    pub related: Vec<RelatedItem>,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

/// A detail bullet. Content may carry the constrained inline-emphasis
/// markup subset (`<span class='font-bold text-gray-900'>`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelatedItem {
    pub title: String,
    #[serde(rename = "type")]
    pub kind: RelatedKind,
    pub image: String,
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelatedKind {
    #[serde(rename = "Learn more")]
    LearnMore,
    #[serde(rename = "Download brochure")]
    DownloadBrochure,
    #[serde(rename = "Case study")]
    CaseStudy,
}
