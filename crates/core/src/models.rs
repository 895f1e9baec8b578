use serde::{Deserialize, Deserializer, Serialize};

/// One clinic service as published by the backend catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceRecord {
    #[serde(default)]
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default, alias = "durationMinutes")]
    pub duration_minutes: Option<u32>,
}

impl ServiceRecord {
    pub fn new(
        id: i64,
        name: impl Into<String>,
        description: impl Into<String>,
        price: Option<f64>,
        duration_minutes: Option<u32>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            description: description.into(),
            price,
            duration_minutes,
        }
    }

    /// Lowercased `name description`, the document the ranker indexes.
    pub fn text(&self) -> String {
        format!("{} {}", self.name, self.description).to_lowercase()
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredService {
    #[serde(flatten)]
    pub service: ServiceRecord,
    pub score: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    BookAppointment,
    AskPrice,
    ServiceInquiry,
    Greeting,
    Goodbye,
    Contact,
    Unknown,
}

impl Intent {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BookAppointment => "book_appointment",
            Self::AskPrice => "ask_price",
            Self::ServiceInquiry => "service_inquiry",
            Self::Greeting => "greeting",
            Self::Goodbye => "goodbye",
            Self::Contact => "contact",
            Self::Unknown => "unknown",
        }
    }

    /// Intents whose reply lists catalog services.
    pub fn wants_suggestions(self) -> bool {
        matches!(self, Self::ServiceInquiry | Self::AskPrice)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntentResult {
    pub intent: Intent,
    pub confidence: f32,
}

impl IntentResult {
    pub fn unknown() -> Self {
        Self {
            intent: Intent::Unknown,
            confidence: 0.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialogResponse {
    /// The message as the user sent it.
    pub query: String,
    pub intent: Intent,
    pub confidence: f32,
    pub entities: Vec<String>,
    pub suggestions: Vec<ScoredService>,
    pub reply: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffordableService {
    pub name: String,
    pub price: f64,
}

/// Aggregates over the catalog currently in effect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogStats {
    pub count: usize,
    pub price_min: f64,
    pub price_max: f64,
    pub price_mean: f64,
    pub avg_duration_minutes: f64,
    pub top_affordable: Vec<AffordableService>,
}

impl Default for CatalogStats {
    fn default() -> Self {
        Self {
            count: 0,
            price_min: 0.0,
            price_max: 0.0,
            price_mean: 0.0,
            avg_duration_minutes: 0.0,
            top_affordable: Vec::new(),
        }
    }
}
