use crate::models::{Credentials, JobRequirements, SearchMode, SearchRequest};

/// Raw search input exactly as the user typed it. List fields are
/// comma-delimited, `min_experience` is free text.
#[derive(Debug, Clone, Default)]
pub struct SearchForm {
    pub job_title: String,
    pub location: String,
    pub keywords: String,
    pub job_description: String,
    pub required_skills: String,
    pub min_experience: String,
    pub search_linkedin: bool,
    pub search_indeed: bool,
    pub linkedin_email: String,
    pub linkedin_password: String,
}

/// Builds the orchestration request. Cannot fail.
///
/// Emptiness checks are raw length checks: a description of only spaces
/// still counts as supplied and turns ranking on.
pub fn build_search_request(form: &SearchForm, shortlist_size: u32) -> SearchRequest {
    let has_description = !form.job_description.is_empty();

    let job_requirements = has_description.then(|| JobRequirements {
        title: form.job_title.clone(),
        description: form.job_description.clone(),
        required_skills: split_list(&form.required_skills),
        min_years_experience: parse_min_years(&form.min_experience),
        location: form.location.clone(),
    });

    // Never send half a login.
    let credentials = (!form.linkedin_email.is_empty() && !form.linkedin_password.is_empty())
        .then(|| Credentials {
            email: form.linkedin_email.clone(),
            password: form.linkedin_password.clone(),
        });

    SearchRequest {
        mode: SearchMode::FullSearch,
        job_title: form.job_title.clone(),
        location: form.location.clone(),
        keywords: split_list(&form.keywords),
        search_linkedin: form.search_linkedin,
        search_indeed: form.search_indeed,
        rank_candidates: has_description,
        shortlist_size,
        job_requirements,
        credentials,
    }
}

/// Splits a comma-delimited field, trimming tokens and dropping blanks.
/// Order and duplicates are kept.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Reads the leading integer out of free text ("5 years" -> 5). Anything
/// unparseable or negative becomes 0.
pub fn parse_min_years(raw: &str) -> u32 {
    let trimmed = raw.trim_start();
    let (negative, rest) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };

    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() || negative {
        return 0;
    }

    digits.parse::<u64>().map(|n| n.min(u32::MAX as u64) as u32).unwrap_or(u32::MAX)
}
