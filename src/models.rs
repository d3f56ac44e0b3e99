use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// --- Outgoing request ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    FullSearch,
    ParseOnly,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobRequirements {
    pub title: String,
    pub description: String,
    pub required_skills: Vec<String>,
    pub min_years_experience: u32,
    pub location: String,
}

/// LinkedIn login forwarded to the backend scraper. Only ever built with
/// both halves filled in.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct Credentials {
    #[serde(rename = "linkedin_email")]
    pub email: String,
    #[serde(rename = "linkedin_password")]
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchRequest {
    pub mode: SearchMode,
    pub job_title: String,
    pub location: String,
    pub keywords: Vec<String>,
    pub search_linkedin: bool,
    pub search_indeed: bool,
    pub rank_candidates: bool,
    pub shortlist_size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_requirements: Option<JobRequirements>,
    #[serde(flatten)]
    pub credentials: Option<Credentials>,
}

// --- Canonical result model ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CandidateSource {
    Linkedin,
    Indeed,
    Upload,
}

impl CandidateSource {
    /// Maps the labels the backend agents stamp on candidates.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "linkedin" => Some(CandidateSource::Linkedin),
            "indeed" => Some(CandidateSource::Indeed),
            "upload" | "uploaded_resume" | "uploaded_resumes" => Some(CandidateSource::Upload),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CandidateSource::Linkedin => "LinkedIn",
            CandidateSource::Indeed => "Indeed",
            CandidateSource::Upload => "Upload",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoringDetail {
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub recommendation: Option<String>,
    #[serde(default)]
    pub red_flags: Vec<String>,
    #[serde(default)]
    pub suggested_next_steps: Vec<String>,
}

impl ScoringDetail {
    pub fn is_empty(&self) -> bool {
        self.strengths.is_empty()
            && self.weaknesses.is_empty()
            && self.recommendation.is_none()
            && self.red_flags.is_empty()
            && self.suggested_next_steps.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub display_name: String,
    pub headline: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub years_of_experience: Option<f64>,
    pub source: Option<CandidateSource>,
    pub profile_url: Option<String>,
    pub summary: Option<String>,
    pub skills: Vec<String>,
    /// Always within 0..=100. `None` means the candidate was never ranked.
    pub overall_score: Option<f64>,
    pub rank: Option<u32>,
    pub scoring: Option<ScoringDetail>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShortlistPick {
    pub name: String,
    pub rank: Option<u32>,
    pub key_reason: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShortlistInsight {
    pub overview: Option<String>,
    pub top_recommendations: Vec<ShortlistPick>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RankingSummary {
    pub top_score: Option<f64>,
    pub average_score: Option<f64>,
    pub shortlist: Option<ShortlistInsight>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub mode: SearchMode,
    /// Length of `candidates`, i.e. what actually gets rendered.
    pub total_candidates_found: usize,
    /// Only sources that contributed at least one candidate.
    pub sources: BTreeMap<String, usize>,
    pub candidates: Vec<CandidateRecord>,
    pub ranking: Option<RankingSummary>,
    pub timestamp: Option<String>,
}

impl SearchResult {
    pub fn is_empty(&self) -> bool {
        self.total_candidates_found == 0
    }
}

// --- Agent status ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AgentState {
    Initialized,
    Idle,
    Running,
    Completed,
    Failed,
    Error,
    Other(String),
}

impl From<String> for AgentState {
    fn from(s: String) -> Self {
        match s.as_str() {
            "initialized" => AgentState::Initialized,
            "idle" => AgentState::Idle,
            "running" => AgentState::Running,
            "completed" => AgentState::Completed,
            "failed" => AgentState::Failed,
            "error" => AgentState::Error,
            _ => AgentState::Other(s),
        }
    }
}

impl From<AgentState> for String {
    fn from(state: AgentState) -> Self {
        state.as_str().to_string()
    }
}

impl AgentState {
    pub fn as_str(&self) -> &str {
        match self {
            AgentState::Initialized => "initialized",
            AgentState::Idle => "idle",
            AgentState::Running => "running",
            AgentState::Completed => "completed",
            AgentState::Failed => "failed",
            AgentState::Error => "error",
            AgentState::Other(s) => s,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentStatusRecord {
    pub agent_id: String,
    pub agent_type: String,
    pub status: AgentState,
    pub created_at: String,
    #[serde(default)]
    pub last_run: Option<String>,
    #[serde(default)]
    pub results_count: u64,
    #[serde(default)]
    pub errors_count: u64,
    #[serde(default)]
    pub config: Option<serde_json::Map<String, serde_json::Value>>,
}

// --- Lenient field decoding ---

/// Numbers from LLM-backed agents sometimes arrive as strings ("5") or junk.
/// Anything that is not a finite number decodes as absent.
pub fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|n| n.is_finite()))
}

pub fn lenient_rank<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_number(deserializer)?
        .filter(|n| *n >= 1.0 && n.fract() == 0.0 && *n <= u32::MAX as f64)
        .map(|n| n as u32))
}
