use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// The content pools a digest is assembled from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Tip,
    Trend,
    Automation,
    Video,
}

impl SourceType {
    /// Fixed reporting order: tips, trends, automations, videos.
    pub const ALL: [SourceType; 4] = [
        SourceType::Tip,
        SourceType::Trend,
        SourceType::Automation,
        SourceType::Video,
    ];

    /// Plural section name used by pools and reports.
    pub fn section(&self) -> &'static str {
        match self {
            SourceType::Tip => "tips",
            SourceType::Trend => "trends",
            SourceType::Automation => "automations",
            SourceType::Video => "videos",
        }
    }
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.section())
    }
}

impl std::str::FromStr for SourceType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tip" | "tips" => Ok(SourceType::Tip),
            "trend" | "trends" => Ok(SourceType::Trend),
            "automation" | "automations" => Ok(SourceType::Automation),
            "video" | "videos" => Ok(SourceType::Video),
            _ => Err(format!("unknown source type: {s}")),
        }
    }
}

/// The text fields the admission controller screens, in scan order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextField {
    Title,
    Description,
    Link,
    Cta,
}

impl TextField {
    pub const ALL: [TextField; 4] = [
        TextField::Title,
        TextField::Description,
        TextField::Link,
        TextField::Cta,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            TextField::Title => "title",
            TextField::Description => "description",
            TextField::Link => "link",
            TextField::Cta => "cta",
        }
    }
}

fn default_category() -> String {
    "general".into()
}

/// One curated item as handed over by the pool loader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRecord {
    #[serde(default)]
    pub title: Option<String>,

    #[serde(default, alias = "desc")]
    pub description: Option<String>,

    #[serde(default)]
    pub link: Option<String>,

    /// Call to action.
    #[serde(default)]
    pub cta: Option<String>,

    #[serde(default = "default_category")]
    pub category: String,

    pub source_type: SourceType,
}

impl ContentRecord {
    pub fn new(source_type: SourceType, title: &str, link: &str) -> Self {
        Self {
            title: Some(title.to_string()),
            description: None,
            link: Some(link.to_string()),
            cta: None,
            category: default_category(),
            source_type,
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn with_cta(mut self, cta: &str) -> Self {
        self.cta = Some(cta.to_string());
        self
    }

    pub fn with_category(mut self, category: &str) -> Self {
        self.category = category.to_string();
        self
    }

    pub fn field(&self, field: TextField) -> Option<&str> {
        match field {
            TextField::Title => self.title.as_deref(),
            TextField::Description => self.description.as_deref(),
            TextField::Link => self.link.as_deref(),
            TextField::Cta => self.cta.as_deref(),
        }
    }

    pub fn set_field(&mut self, field: TextField, value: String) {
        let slot = match field {
            TextField::Title => &mut self.title,
            TextField::Description => &mut self.description,
            TextField::Link => &mut self.link,
            TextField::Cta => &mut self.cta,
        };
        *slot = Some(value);
    }

    /// Normalize the shape: required fields become present (empty if missing),
    /// blank optional fields are dropped and a blank category falls back to `general`.
    pub fn validate(mut self) -> Self {
        for field in [TextField::Title, TextField::Link] {
            if self.field(field).is_none() {
                self.set_field(field, String::new());
            }
        }
        for slot in [&mut self.description, &mut self.cta] {
            if slot.as_deref().is_some_and(|s| s.trim().is_empty()) {
                *slot = None;
            }
        }
        if self.category.trim().is_empty() {
            self.category = default_category();
        }
        self
    }

    /// Title for log lines and reports.
    pub fn display_title(&self) -> &str {
        match self.title.as_deref() {
            Some(t) if !t.is_empty() => t,
            _ => "(untitled)",
        }
    }

    /// Stable SHA-256 over the identifying fields, hex encoded.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.source_type.section().as_bytes());
        for field in TextField::ALL {
            hasher.update([0u8]);
            hasher.update(self.field(field).unwrap_or("").as_bytes());
        }
        format!("{:x}", hasher.finalize())
    }
}
