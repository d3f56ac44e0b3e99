use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::{ClientError, Result};
use crate::models::{AgentStatusRecord, SearchRequest};
use crate::normalize::Payload;

/// Multipart field name the upload endpoint reads.
const UPLOAD_FIELD: &str = "files";

/// One resume selected for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumeFile {
    pub file_name: String,
    pub contents: Vec<u8>,
}

impl ResumeFile {
    pub async fn read(path: &Path) -> Result<Self> {
        let contents = tokio::fs::read(path).await.map_err(|source| ClientError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self { file_name, contents })
    }

    pub async fn read_all(paths: &[PathBuf]) -> Result<Vec<Self>> {
        let mut files = Vec::with_capacity(paths.len());
        for path in paths {
            files.push(Self::read(path).await?);
        }
        Ok(files)
    }
}

#[derive(Debug, Deserialize)]
struct UploadReceipt {
    file_paths: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ResumeListing {
    files: Vec<String>,
}

/// HTTP client for the recruiting backend. Every call is issued once: no
/// retries, no timeout beyond the transport's own.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base: Url,
}

impl ApiClient {
    pub fn new(base: Url) -> Self {
        Self {
            http: Client::new(),
            base,
        }
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::Config(format!("API base {} cannot take a path", self.base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    // --- Search protocol ---

    /// `POST /orchestrate` with the built request.
    pub async fn orchestrate(&self, request: &SearchRequest) -> Result<Payload> {
        let url = self.endpoint(&["orchestrate"])?;
        info!(
            title = %request.job_title,
            keywords = request.keywords.len(),
            ranked = request.rank_candidates,
            "starting candidate search"
        );

        let response = self.http.post(url).json(request).send().await?;
        let response = ensure_success(response, "HTTP error")?;
        let body: Value = read_json(response, "search response").await?;
        Ok(Payload::Orchestrate(body))
    }

    // --- Upload-and-parse protocol ---

    /// Uploads the selection, then parses whatever the backend stored.
    /// The parse call is only made once the upload has succeeded.
    pub async fn upload_and_parse(&self, files: Vec<ResumeFile>) -> Result<Payload> {
        if files.is_empty() {
            return Err(ClientError::Validation(
                "Please select at least one file".to_string(),
            ));
        }

        let stored = self.upload_resumes(files).await?;
        let body = self.parse_resumes(&stored).await?;
        Ok(Payload::Parse(body))
    }

    async fn upload_resumes(&self, files: Vec<ResumeFile>) -> Result<Vec<String>> {
        let url = self.endpoint(&["upload-resumes"])?;
        let count = files.len();

        let form = files.into_iter().fold(Form::new(), |form, file| {
            form.part(UPLOAD_FIELD, Part::bytes(file.contents).file_name(file.file_name))
        });

        let response = self.http.post(url).multipart(form).send().await?;
        let response = ensure_success(response, "Upload failed")?;
        let receipt: UploadReceipt = read_json(response, "upload response").await?;

        info!(sent = count, stored = receipt.file_paths.len(), "uploaded resumes");
        Ok(receipt.file_paths)
    }

    async fn parse_resumes(&self, file_paths: &[String]) -> Result<Value> {
        let url = self.endpoint(&["parse-resumes"])?;
        debug!(files = file_paths.len(), "parsing uploaded resumes");

        let response = self.http.post(url).json(file_paths).send().await?;
        let response = ensure_success(response, "Parsing failed")?;
        read_json(response, "parse response").await
    }

    // --- Uploaded file management ---

    pub async fn list_resumes(&self) -> Result<Vec<String>> {
        let url = self.endpoint(&["resumes"])?;
        let response = self.http.get(url).send().await?;
        let response = ensure_success(response, "Listing uploads failed")?;
        let listing: ResumeListing = read_json(response, "resume listing").await?;
        Ok(listing.files)
    }

    /// Deletes one uploaded file. Confirming with the user is the caller's job.
    pub async fn delete_resume(&self, filename: &str) -> Result<()> {
        // "." and ".." would be dropped from the path and hit the collection.
        if matches!(filename, "" | "." | "..") {
            return Err(ClientError::Validation(format!("Invalid file name '{filename}'")));
        }
        let url = self.endpoint(&["resumes", filename])?;
        let response = self.http.delete(url).send().await?;
        ensure_success(response, "Delete failed")?;
        info!(filename, "deleted uploaded resume");
        Ok(())
    }

    // --- Agent status ---

    pub async fn agent_status(&self) -> Result<BTreeMap<String, AgentStatusRecord>> {
        let url = self.endpoint(&["agents", "status"])?;
        let response = self.http.get(url).send().await?;
        let response = ensure_success(response, "Agent status failed")?;
        read_json(response, "agent status").await
    }
}

fn ensure_success(response: Response, message: &str) -> Result<Response> {
    let status = response.status();
    if !status.is_success() {
        warn!(url = %response.url(), %status, "{}", message);
        return Err(ClientError::transport(status, message));
    }
    Ok(response)
}

async fn read_json<T: DeserializeOwned>(response: Response, what: &str) -> Result<T> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| ClientError::MalformedResponse(format!("{what}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{build_search_request, SearchForm};
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> ApiClient {
        ApiClient::new(Url::parse(&format!("{}/api", server.uri())).unwrap())
    }

    fn resume(name: &str) -> ResumeFile {
        ResumeFile {
            file_name: name.to_string(),
            contents: b"resume text".to_vec(),
        }
    }

    fn search_request() -> SearchRequest {
        build_search_request(
            &SearchForm {
                job_title: "Data Engineer".to_string(),
                keywords: "spark, airflow".to_string(),
                search_linkedin: true,
                ..Default::default()
            },
            10,
        )
    }

    #[test]
    fn test_endpoint_joins_below_base_path() {
        let client = ApiClient::new(Url::parse("http://localhost:8000/api/").unwrap());
        assert_eq!(
            client.endpoint(&["agents", "status"]).unwrap().as_str(),
            "http://localhost:8000/api/agents/status"
        );
        assert_eq!(
            client.endpoint(&["resumes", "cv final.pdf"]).unwrap().as_str(),
            "http://localhost:8000/api/resumes/cv%20final.pdf"
        );
    }

    #[tokio::test]
    async fn test_orchestrate_posts_request_and_tags_payload() {
        let server = MockServer::start().await;
        let body = json!({"total_candidates_found": 0, "sources": {}, "candidates": []});
        Mock::given(method("POST"))
            .and(path("/api/orchestrate"))
            .and(body_json(json!({
                "mode": "full_search",
                "job_title": "Data Engineer",
                "location": "",
                "keywords": ["spark", "airflow"],
                "search_linkedin": true,
                "search_indeed": false,
                "rank_candidates": false,
                "shortlist_size": 10
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(body.clone()))
            .expect(1)
            .mount(&server)
            .await;

        let payload = client_for(&server).orchestrate(&search_request()).await.unwrap();
        assert_eq!(payload, Payload::Orchestrate(body));
    }

    #[tokio::test]
    async fn test_orchestrate_non_success_is_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/orchestrate"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let err = client_for(&server).orchestrate(&search_request()).await.unwrap_err();
        assert_eq!(err.status(), Some(503));
        assert_eq!(err.to_string(), "HTTP error! status: 503");
    }

    #[tokio::test]
    async fn test_orchestrate_non_json_body_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/orchestrate"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = client_for(&server).orchestrate(&search_request()).await.unwrap_err();
        assert!(matches!(err, ClientError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_upload_then_parse_forwards_stored_paths() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/upload-resumes"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "files_uploaded": 2,
                "file_paths": ["data/resumes/a.pdf", "data/resumes/b.txt"]
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/parse-resumes"))
            .and(body_json(json!(["data/resumes/a.pdf", "data/resumes/b.txt"])))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"name": "A"}, {"name": "B"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let payload = client_for(&server)
            .upload_and_parse(vec![resume("a.pdf"), resume("b.txt")])
            .await
            .unwrap();
        assert!(matches!(payload, Payload::Parse(_)));

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].url.path(), "/api/upload-resumes");
        let upload_body = String::from_utf8_lossy(&requests[0].body);
        assert!(upload_body.contains("name=\"files\"; filename=\"a.pdf\""));
        assert!(upload_body.contains("name=\"files\"; filename=\"b.txt\""));
        assert_eq!(requests[1].url.path(), "/api/parse-resumes");
    }

    #[tokio::test]
    async fn test_failed_upload_never_reaches_parse() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/upload-resumes"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/parse-resumes"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
            .expect(0)
            .mount(&server)
            .await;

        let err = client_for(&server)
            .upload_and_parse(vec![resume("a.pdf")])
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert_eq!(err.to_string(), "Upload failed! status: 500");
    }

    #[tokio::test]
    async fn test_failed_parse_reports_parse_step() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/upload-resumes"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"file_paths": ["x.pdf"]})))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/parse-resumes"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let err = client_for(&server)
            .upload_and_parse(vec![resume("x.pdf")])
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert_eq!(err.to_string(), "Parsing failed! status: 500");
    }

    #[tokio::test]
    async fn test_empty_selection_makes_no_requests() {
        let server = MockServer::start().await;
        let err = client_for(&server).upload_and_parse(Vec::new()).await.unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_and_delete_resumes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/resumes"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "count": 2,
                "files": ["a.pdf", "cv final.pdf"]
            })))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/api/resumes/cv%20final.pdf"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/api/resumes/missing.pdf"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = client_for(&server);
        assert_eq!(client.list_resumes().await.unwrap(), vec!["a.pdf", "cv final.pdf"]);
        client.delete_resume("cv final.pdf").await.unwrap();
        let err = client.delete_resume("missing.pdf").await.unwrap_err();
        assert_eq!(err.status(), Some(404));
    }

    #[tokio::test]
    async fn test_delete_rejects_names_that_escape_the_file() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = client_for(&server);
        for name in ["", ".", ".."] {
            let err = client.delete_resume(name).await.unwrap_err();
            assert!(matches!(err, ClientError::Validation(_)), "accepted {name:?}");
        }
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_agent_status_decodes_roster() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/agents/status"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "orchestrator": {
                    "agent_id": "orc-1",
                    "agent_type": "AgentOrchestrator",
                    "status": "idle",
                    "created_at": "2024-05-01T10:00:00",
                    "last_run": null,
                    "results_count": 0,
                    "errors_count": 0,
                    "config": {}
                }
            })))
            .mount(&server)
            .await;

        let roster = client_for(&server).agent_status().await.unwrap();
        assert_eq!(roster.len(), 1);
        assert_eq!(roster["orchestrator"].agent_type, "AgentOrchestrator");
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_network_error() {
        let client = ApiClient::new(Url::parse("http://127.0.0.1:9/api").unwrap());
        let err = client.orchestrate(&search_request()).await.unwrap_err();
        assert!(matches!(err, ClientError::Network(_)));
        assert_eq!(err.status(), None);
    }

    #[tokio::test]
    async fn test_read_resume_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("jane.txt");
        std::fs::write(&file_path, "Jane Doe\nRust").unwrap();

        let file = ResumeFile::read(&file_path).await.unwrap();
        assert_eq!(file.file_name, "jane.txt");
        assert_eq!(file.contents, b"Jane Doe\nRust");

        let err = ResumeFile::read(&dir.path().join("nope.pdf")).await.unwrap_err();
        assert!(matches!(err, ClientError::Io { .. }));
    }
}
