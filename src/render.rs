use std::fmt::Write;

use crate::models::{CandidateRecord, RankingSummary, ScoringDetail, SearchResult};
use crate::normalize::UPLOADED_RESUMES;
use crate::score::MatchTier;
use crate::status::StatusReport;

const WIDTH: usize = 80;

/// Score shown next to a ranked candidate. Unranked candidates have none.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreBadge {
    pub score: f64,
    pub tier: MatchTier,
}

impl ScoreBadge {
    pub fn for_candidate(candidate: &CandidateRecord) -> Option<Self> {
        let tier = MatchTier::for_score(candidate.overall_score)?;
        Some(Self {
            score: candidate.overall_score?,
            tier,
        })
    }

    pub fn text(&self) -> String {
        format!("{:.0}/100 {}", self.score, self.tier)
    }
}

// --- Search results ---

pub fn render_result(result: &SearchResult) -> String {
    if result.is_empty() {
        return "No candidates found\n".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(out, "Search Results Summary");
    if let Some(ts) = &result.timestamp {
        let _ = writeln!(out, "  Generated: {}", format_timestamp(ts));
    }
    let _ = writeln!(out, "  Total Candidates: {}", result.total_candidates_found);
    for (source, count) in &result.sources {
        let _ = writeln!(out, "  From {}: {}", source_heading(source), count);
    }
    if let Some(ranking) = &result.ranking {
        render_ranking(&mut out, ranking);
    }
    let _ = writeln!(out, "{}", "-".repeat(WIDTH));

    for candidate in &result.candidates {
        out.push_str(&render_candidate(candidate));
        out.push('\n');
    }
    out
}

fn source_heading(key: &str) -> &str {
    match key {
        "linkedin" => "LinkedIn",
        "indeed" => "Indeed",
        UPLOADED_RESUMES => "Uploads",
        other => other,
    }
}

fn render_ranking(out: &mut String, ranking: &RankingSummary) {
    match (ranking.top_score, ranking.average_score) {
        (Some(top), Some(avg)) => {
            let _ = writeln!(out, "  Top Score: {:.0}   Average Score: {:.1}", top, avg);
        }
        (Some(top), None) => {
            let _ = writeln!(out, "  Top Score: {:.0}", top);
        }
        (None, Some(avg)) => {
            let _ = writeln!(out, "  Average Score: {:.1}", avg);
        }
        (None, None) => {}
    }

    let Some(shortlist) = &ranking.shortlist else { return };
    if let Some(overview) = &shortlist.overview {
        let _ = writeln!(out, "  Shortlist:");
        let _ = writeln!(out, "{}", wrap(overview, 4));
    }
    for pick in &shortlist.top_recommendations {
        let rank = pick.rank.map(|r| format!("#{} ", r)).unwrap_or_default();
        match &pick.key_reason {
            Some(reason) => {
                let _ = writeln!(out, "    {}{}: {}", rank, pick.name, reason);
            }
            None => {
                let _ = writeln!(out, "    {}{}", rank, pick.name);
            }
        }
    }
}

pub fn render_candidate(candidate: &CandidateRecord) -> String {
    let mut out = String::new();

    let title = match candidate.rank {
        Some(rank) => format!("#{} {}", rank, candidate.display_name),
        None => candidate.display_name.clone(),
    };
    match ScoreBadge::for_candidate(candidate) {
        Some(badge) => {
            let badge = badge.text();
            let room = WIDTH.saturating_sub(badge.len() + 1);
            let _ = writeln!(out, "{:<room$} {}", truncate(&title, room), badge);
        }
        None => {
            let _ = writeln!(out, "{}", title);
        }
    }

    if let Some(headline) = &candidate.headline {
        let _ = writeln!(out, "  {}", headline);
    }
    if let Some(email) = &candidate.email {
        let _ = writeln!(out, "  Email: {}", email);
    }
    if let Some(phone) = &candidate.phone {
        let _ = writeln!(out, "  Phone: {}", phone);
    }
    if let Some(location) = &candidate.location {
        let _ = writeln!(out, "  Location: {}", location);
    }
    if let Some(years) = candidate.years_of_experience {
        let _ = writeln!(out, "  Experience: {} years", format_years(years));
    }
    if let Some(source) = candidate.source {
        let _ = writeln!(out, "  Source: {}", source.label());
    }
    if let Some(url) = &candidate.profile_url {
        let _ = writeln!(out, "  Profile: {}", url);
    }
    if let Some(summary) = &candidate.summary {
        let _ = writeln!(out, "  Summary:");
        let _ = writeln!(out, "{}", wrap(summary, 4));
    }
    if !candidate.skills.is_empty() {
        let _ = writeln!(out, "  Skills: {}", candidate.skills.join(", "));
    }
    if let Some(scoring) = &candidate.scoring {
        render_scoring(&mut out, scoring);
    }
    out
}

fn render_scoring(out: &mut String, scoring: &ScoringDetail) {
    let _ = writeln!(out, "  AI Analysis:");
    let sections = [
        ("Strengths", &scoring.strengths),
        ("Areas of Concern", &scoring.weaknesses),
        ("Red Flags", &scoring.red_flags),
        ("Next Steps", &scoring.suggested_next_steps),
    ];
    for (heading, items) in sections {
        if items.is_empty() {
            continue;
        }
        let _ = writeln!(out, "    {}:", heading);
        for item in items {
            let _ = writeln!(out, "      - {}", item);
        }
    }
    if let Some(recommendation) = &scoring.recommendation {
        let _ = writeln!(out, "    Recommendation:");
        let _ = writeln!(out, "{}", wrap(recommendation, 6));
    }
}

fn format_years(years: f64) -> String {
    if years.fract() == 0.0 {
        format!("{:.0}", years)
    } else {
        format!("{:.1}", years)
    }
}

// --- Agent status ---

pub fn render_status(report: &StatusReport) -> String {
    let Some(roster) = report.roster() else {
        return "Failed to load agent status\n".to_string();
    };
    if roster.is_empty() {
        return "No agents reported\n".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<22} {:<11} {:<14} {:<19} {:<19} {:>7} {:>6}",
        "AGENT", "STATUS", "ID", "CREATED", "LAST RUN", "RESULTS", "ERRORS"
    );
    let _ = writeln!(out, "{}", "-".repeat(104));
    for agent in roster.values() {
        let _ = writeln!(
            out,
            "{:<22} {:<11} {:<14} {:<19} {:<19} {:>7} {:>6}",
            truncate(&agent.agent_type, 20),
            agent.status.as_str().to_uppercase(),
            truncate(&agent.agent_id, 12),
            format_timestamp(&agent.created_at),
            agent.last_run.as_deref().map(format_timestamp).unwrap_or_else(|| "-".to_string()),
            agent.results_count,
            agent.errors_count
        );
    }
    out
}

/// Local time for RFC 3339 stamps, as-is for naive ISO stamps, raw otherwise.
pub fn format_timestamp(raw: &str) -> String {
    const DISPLAY: &str = "%Y-%m-%d %H:%M:%S";
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(raw) {
        return dt.with_timezone(&chrono::Local).format(DISPLAY).to_string();
    }
    if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return dt.format(DISPLAY).to_string();
    }
    raw.to_string()
}

// --- Uploaded files ---

pub fn render_uploaded(files: &[String]) -> String {
    if files.is_empty() {
        return "No files uploaded yet\n".to_string();
    }
    let mut out = String::new();
    for file in files {
        let _ = writeln!(out, "  {}", file);
    }
    out
}

/// `(name, size in bytes)` pairs for the files about to be uploaded.
pub fn render_selection(files: &[(String, u64)]) -> String {
    let mut out = String::new();
    for (name, size) in files {
        let _ = writeln!(out, "  {} ({})", name, format_file_size(*size));
    }
    out
}

pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let rounded = (value * 100.0).round() / 100.0;
    format!("{} {}", rounded, UNITS[unit])
}

// --- Helpers ---

fn wrap(text: &str, indent: usize) -> String {
    let pad = " ".repeat(indent);
    let options = textwrap::Options::new(WIDTH)
        .initial_indent(&pad)
        .subsequent_indent(&pad);
    textwrap::fill(text, options)
}

pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
