use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

use crate::error::{ClientError, Result};
use crate::models::{
    lenient_number, lenient_rank, CandidateRecord, CandidateSource, RankingSummary,
    ScoringDetail, SearchMode, SearchResult, ShortlistInsight, ShortlistPick,
};

/// Display name used when a candidate has neither a name nor a title.
pub const UNKNOWN_NAME: &str = "Unknown";

/// Source key the parse protocol reports its candidates under.
pub const UPLOADED_RESUMES: &str = "uploaded_resumes";

/// A response body tagged with the protocol that produced it. The tag, not
/// the body's shape, decides how it is normalized.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Body of `POST /orchestrate`.
    Orchestrate(Value),
    /// Body of `POST /parse-resumes`.
    Parse(Value),
}

pub fn normalize(payload: Payload) -> Result<SearchResult> {
    match payload {
        Payload::Orchestrate(body) => normalize_search(body),
        Payload::Parse(body) => normalize_parse(body),
    }
}

// --- Wire shapes ---

#[derive(Debug, Deserialize)]
struct OrchestrateBody {
    #[serde(default)]
    total_candidates_found: Option<u64>,
    #[serde(default)]
    sources: Option<BTreeMap<String, u64>>,
    #[serde(default)]
    candidates: Option<Vec<RawCandidate>>,
    #[serde(default)]
    ranked_results: Option<RankedResults>,
    #[serde(default)]
    timestamp: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RankedResults {
    #[serde(default)]
    ranked_candidates: Option<Vec<RawCandidate>>,
    #[serde(default, deserialize_with = "lenient_number")]
    top_score: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    average_score: Option<f64>,
    #[serde(default)]
    shortlist: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ParseBody {
    candidates: Vec<RawCandidate>,
}

#[derive(Debug, Deserialize)]
struct RawCandidate {
    #[serde(default, deserialize_with = "lenient_text")]
    name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    title: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    headline: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    email: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    phone: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    location: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    years_of_experience: Option<f64>,
    #[serde(default, deserialize_with = "lenient_text")]
    source: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    profile_url: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    summary: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    snippet: Option<String>,
    #[serde(default, deserialize_with = "lenient_strings")]
    skills: Vec<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    overall_score: Option<f64>,
    #[serde(default, deserialize_with = "lenient_rank")]
    rank: Option<u32>,
    #[serde(default)]
    scoring: Option<RawScoring>,
}

#[derive(Debug, Deserialize)]
struct RawScoring {
    #[serde(default, deserialize_with = "lenient_strings")]
    strengths: Vec<String>,
    #[serde(default, deserialize_with = "lenient_strings")]
    weaknesses: Vec<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    recommendation: Option<String>,
    #[serde(default, deserialize_with = "lenient_strings")]
    red_flags: Vec<String>,
    #[serde(default, deserialize_with = "lenient_strings")]
    suggested_next_steps: Vec<String>,
}

/// Strings decode as themselves; empty strings and non-strings as absent.
fn lenient_text<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) if !s.is_empty() => Some(s),
        _ => None,
    })
}

/// Keeps the non-empty string entries of a list; anything else is dropped.
fn lenient_strings<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) if !s.is_empty() => Some(s),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    })
}

// --- Per-protocol normalization ---

fn normalize_search(body: Value) -> Result<SearchResult> {
    let body: OrchestrateBody = serde_json::from_value(body)
        .map_err(|e| ClientError::MalformedResponse(format!("search response: {e}")))?;

    // A ranked list replaces the raw one outright; the two are never merged.
    let (raw, ranking) = match body.ranked_results {
        Some(RankedResults {
            ranked_candidates: Some(ranked),
            top_score,
            average_score,
            shortlist,
        }) => {
            let ranking = RankingSummary {
                top_score: top_score.map(clamp_score),
                average_score: average_score.map(clamp_score),
                shortlist: shortlist.as_ref().and_then(shortlist_insight),
            };
            (ranked, Some(ranking))
        }
        _ => {
            let raw = body.candidates.ok_or_else(|| {
                ClientError::MalformedResponse(
                    "search response has neither candidates nor ranked_results.ranked_candidates"
                        .to_string(),
                )
            })?;
            (raw, None)
        }
    };

    let candidates: Vec<CandidateRecord> = raw.into_iter().map(normalize_candidate).collect();
    if let Some(reported) = body.total_candidates_found {
        if reported as usize != candidates.len() {
            debug!(reported, rendered = candidates.len(), "candidate count differs from backend total");
        }
    }

    Ok(SearchResult {
        mode: SearchMode::FullSearch,
        total_candidates_found: candidates.len(),
        sources: contributing_sources(body.sources.unwrap_or_default()),
        candidates,
        ranking,
        timestamp: body.timestamp,
    })
}

fn normalize_parse(body: Value) -> Result<SearchResult> {
    let body: ParseBody = serde_json::from_value(body)
        .map_err(|e| ClientError::MalformedResponse(format!("parse response: {e}")))?;

    // Always reports the upload count, zero included.
    let count = body.candidates.len();
    let sources = BTreeMap::from([(UPLOADED_RESUMES.to_string(), count)]);

    Ok(SearchResult {
        mode: SearchMode::ParseOnly,
        total_candidates_found: count,
        sources,
        candidates: body.candidates.into_iter().map(normalize_candidate).collect(),
        ranking: None,
        timestamp: None,
    })
}

fn contributing_sources(sources: BTreeMap<String, u64>) -> BTreeMap<String, usize> {
    sources
        .into_iter()
        .filter(|(_, count)| *count > 0)
        .map(|(name, count)| (name, count as usize))
        .collect()
}

fn normalize_candidate(raw: RawCandidate) -> CandidateRecord {
    let source = raw.source.as_deref().and_then(|label| {
        let parsed = CandidateSource::from_label(label);
        if parsed.is_none() {
            debug!(label, "unrecognized candidate source");
        }
        parsed
    });

    CandidateRecord {
        display_name: resolve_display_name(raw.name.as_deref(), raw.title.as_deref()),
        headline: raw.headline,
        email: raw.email,
        phone: raw.phone,
        location: raw.location,
        years_of_experience: raw.years_of_experience.filter(|y| *y >= 0.0),
        source,
        profile_url: raw.profile_url,
        summary: resolve_summary(raw.summary, raw.snippet),
        skills: raw.skills,
        overall_score: raw.overall_score.map(clamp_score),
        rank: raw.rank,
        scoring: raw.scoring.map(|s| ScoringDetail {
            strengths: s.strengths,
            weaknesses: s.weaknesses,
            recommendation: s.recommendation,
            red_flags: s.red_flags,
            suggested_next_steps: s.suggested_next_steps,
        })
        .filter(|s| !s.is_empty()),
    }
}

fn clamp_score(score: f64) -> f64 {
    score.clamp(0.0, 100.0)
}

// --- Fallback policies ---

/// First entry that is present and non-empty, in priority order.
pub fn first_present<'a, I>(options: I) -> Option<&'a str>
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    options.into_iter().flatten().find(|s| !s.is_empty())
}

/// Display name priority: `name`, then `title` (job postings carry only a
/// title), then [`UNKNOWN_NAME`].
pub fn resolve_display_name(name: Option<&str>, title: Option<&str>) -> String {
    first_present([name, title]).unwrap_or(UNKNOWN_NAME).to_string()
}

/// Summary priority: `summary`, then `snippet`.
pub fn resolve_summary(summary: Option<String>, snippet: Option<String>) -> Option<String> {
    first_present([summary.as_deref(), snippet.as_deref()]).map(str::to_string)
}

fn shortlist_insight(shortlist: &Value) -> Option<ShortlistInsight> {
    let summary = shortlist.get("summary")?;
    let overview = match summary {
        Value::String(s) => Some(s.as_str()),
        Value::Object(_) => summary.get("summary").and_then(Value::as_str),
        _ => None,
    }
    .filter(|s| !s.is_empty())
    .map(str::to_string);

    let top_recommendations: Vec<ShortlistPick> = summary
        .get("top_recommendations")
        .and_then(Value::as_array)
        .map(|picks| {
            picks
                .iter()
                .filter_map(|pick| {
                    let name = pick.get("name")?.as_str()?;
                    Some(ShortlistPick {
                        name: name.to_string(),
                        rank: pick
                            .get("rank")
                            .and_then(Value::as_u64)
                            .and_then(|r| u32::try_from(r).ok()),
                        key_reason: pick
                            .get("key_reason")
                            .and_then(Value::as_str)
                            .map(str::to_string),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    if overview.is_none() && top_recommendations.is_empty() {
        return None;
    }

    Some(ShortlistInsight {
        overview,
        top_recommendations,
    })
}
