use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, warn};

use crate::client::ApiClient;
use crate::models::AgentStatusRecord;

pub type AgentRoster = BTreeMap<String, AgentStatusRecord>;

/// Outcome of one status poll. A failed poll and a poll that found no agents
/// are different things and render differently.
#[derive(Debug, Clone, PartialEq)]
pub enum StatusReport {
    Loaded(AgentRoster),
    Failed(String),
}

impl StatusReport {
    pub fn is_failed(&self) -> bool {
        matches!(self, StatusReport::Failed(_))
    }

    pub fn roster(&self) -> Option<&AgentRoster> {
        match self {
            StatusReport::Loaded(roster) => Some(roster),
            StatusReport::Failed(_) => None,
        }
    }
}

/// Fetches the agent roster once. Records are passed through untouched.
pub async fn poll(client: &ApiClient) -> StatusReport {
    match client.agent_status().await {
        Ok(roster) => {
            debug!(agents = roster.len(), "agent status loaded");
            StatusReport::Loaded(roster)
        }
        Err(e) => {
            warn!(status = e.status(), "Error loading agent status: {}", e);
            StatusReport::Failed(e.to_string())
        }
    }
}

/// Polls on a fixed interval until `keep_going` returns false for a report.
/// The first poll fires immediately.
pub async fn watch<F>(client: &ApiClient, every: Duration, mut keep_going: F)
where
    F: FnMut(&StatusReport) -> bool,
{
    let mut ticker = tokio::time::interval(every);
    loop {
        ticker.tick().await;
        let report = poll(client).await;
        if !keep_going(&report) {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AgentState;
    use reqwest::Url;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> ApiClient {
        ApiClient::new(Url::parse(&format!("{}/api", server.uri())).unwrap())
    }

    #[tokio::test]
    async fn test_poll_passes_records_through() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/agents/status"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "resume_parser": {
                    "agent_id": "rp-1",
                    "agent_type": "ResumeParserAgent",
                    "status": "running",
                    "created_at": "2024-05-01T10:00:00",
                    "last_run": "2024-05-01T10:05:00",
                    "results_count": 4,
                    "errors_count": 1,
                    "config": {"model": "gpt-4"}
                },
                "candidate_ranker": {
                    "agent_id": "cr-1",
                    "agent_type": "CandidateRankerAgent",
                    "status": "completed",
                    "created_at": "2024-05-01T10:00:00",
                    "results_count": 1,
                    "errors_count": 0
                }
            })))
            .mount(&server)
            .await;

        let report = poll(&client_for(&server)).await;
        let roster = report.roster().unwrap();
        assert_eq!(roster.len(), 2);

        let parser = &roster["resume_parser"];
        assert_eq!(parser.status, AgentState::Running);
        assert_eq!(parser.last_run.as_deref(), Some("2024-05-01T10:05:00"));
        assert_eq!(parser.results_count, 4);
        assert_eq!(parser.errors_count, 1);
        assert_eq!(parser.config.as_ref().unwrap()["model"], json!("gpt-4"));

        assert_eq!(roster["candidate_ranker"].status, AgentState::Completed);
        assert!(roster["candidate_ranker"].last_run.is_none());
    }

    #[tokio::test]
    async fn test_empty_roster_is_not_a_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/agents/status"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let report = poll(&client_for(&server)).await;
        assert!(!report.is_failed());
        assert!(report.roster().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_server_error_is_a_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/agents/status"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let report = poll(&client_for(&server)).await;
        assert!(report.is_failed());
        assert!(report.roster().is_none());
    }

    #[tokio::test]
    async fn test_watch_stops_when_told() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/agents/status"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(3)
            .mount(&server)
            .await;

        let mut seen = 0;
        watch(&client_for(&server), Duration::from_millis(5), |_| {
            seen += 1;
            seen < 3
        })
        .await;
        assert_eq!(seen, 3);
    }
}
