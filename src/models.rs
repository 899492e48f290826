use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::PlannerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Topic {
    Sights,
    Food,
    Lodging,
    Insights,
    Images,
    Synthesis,
}

impl Topic {
    pub const ALL: [Topic; 6] = [
        Topic::Sights,
        Topic::Food,
        Topic::Lodging,
        Topic::Insights,
        Topic::Images,
        Topic::Synthesis,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::Sights => "sights",
            Topic::Food => "food",
            Topic::Lodging => "lodging",
            Topic::Insights => "insights",
            Topic::Images => "images",
            Topic::Synthesis => "synthesis",
        }
    }

    /// Topics answered by a generative responder rather than a search provider.
    pub fn is_generative(&self) -> bool {
        !matches!(self, Topic::Insights | Topic::Images)
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Topic {
    type Err = PlannerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sights" | "attractions" => Ok(Topic::Sights),
            "food" => Ok(Topic::Food),
            "lodging" | "accommodation" => Ok(Topic::Lodging),
            "insights" | "reviews" => Ok(Topic::Insights),
            "images" => Ok(Topic::Images),
            "synthesis" | "planner" => Ok(Topic::Synthesis),
            _ => Err(PlannerError::UnknownCategory(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub topic: Topic,
    pub text: String,
}

impl Query {
    pub fn new(topic: Topic, text: impl Into<String>) -> Self {
        Self {
            topic,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TravelPreferences {
    pub destination: String,
    pub trip_length: u32,
    #[serde(default = "default_budget")]
    pub budget: String,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default)]
    pub get_insights: bool,
    #[serde(default)]
    pub get_images: bool,
}

fn default_budget() -> String {
    "moderate".to_string()
}

/// The composite result of one orchestration run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanDocument {
    pub id: String,
    pub destination: String,
    pub trip_length: u32,
    pub budget: String,
    pub interests: Vec<String>,
    pub itinerary: String,
    pub sights: String,
    pub food: String,
    pub lodging: String,
    pub insights: String,
    pub images: Vec<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub total_time_ms: u64,
    pub step_times: HashMap<String, u64>,
}

/// Workflow state shared between orchestration steps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanContext {
    pub preferences: TravelPreferences,
    pub sights: String,
    pub food: String,
    pub lodging: String,
    pub insights: String,
    pub images: Vec<String>,
    pub itinerary: String,
}

impl PlanContext {
    pub fn new(preferences: TravelPreferences) -> Self {
        Self {
            preferences,
            sights: String::new(),
            food: String::new(),
            lodging: String::new(),
            insights: String::new(),
            images: vec![],
            itinerary: String::new(),
        }
    }

    pub fn section_mut(&mut self, topic: Topic) -> Option<&mut String> {
        match topic {
            Topic::Sights => Some(&mut self.sights),
            Topic::Food => Some(&mut self.food),
            Topic::Lodging => Some(&mut self.lodging),
            Topic::Insights => Some(&mut self.insights),
            Topic::Synthesis => Some(&mut self.itinerary),
            Topic::Images => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub link: String,
    pub snippet: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageHit {
    pub title: String,
    pub link: String,
    pub thumbnail: String,
    pub context_link: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLink {
    pub title: String,
    pub url: String,
    pub source_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentQuery {
    pub agent_type: String,
    pub query: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentResponse {
    pub response: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GoogleSearchResponse {
    #[serde(default)]
    pub items: Vec<GoogleSearchItem>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GoogleSearchItem {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub snippet: String,
    pub image: Option<GoogleImageInfo>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleImageInfo {
    pub thumbnail_link: Option<String>,
    pub context_link: Option<String>,
}
