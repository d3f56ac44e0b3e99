use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::client::{ApiClient, ResumeFile};
use crate::error::{ClientError, Result};
use crate::models::SearchResult;
use crate::normalize::normalize;
use crate::request::{build_search_request, SearchForm};

/// One user's working session against the backend. Owns the "current
/// result": a successful operation replaces it whole, a failed one leaves it
/// as it was.
pub struct Session {
    client: ApiClient,
    shortlist_size: u32,
    current: Option<SearchResult>,
    store: Option<PathBuf>,
}

impl Session {
    pub fn new(client: ApiClient, shortlist_size: u32) -> Self {
        Self {
            client,
            shortlist_size,
            current: None,
            store: None,
        }
    }

    /// Mirrors every committed result to `path` so later runs can show it.
    pub fn with_store(mut self, path: PathBuf) -> Self {
        self.store = Some(path);
        self
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn current(&self) -> Option<&SearchResult> {
        self.current.as_ref()
    }

    /// Loads the stored result into the slot. Without a store, or with nothing
    /// saved yet, the slot stays as it is.
    pub fn restore(&mut self) -> Result<()> {
        let Some(path) = &self.store else { return Ok(()) };
        if let Some(result) = load_result(path)? {
            info!(path = %path.display(), "restored saved result");
            self.current = Some(result);
        }
        Ok(())
    }

    /// Search protocol: build, send, normalize, commit.
    pub async fn search(&mut self, form: &SearchForm) -> Result<&SearchResult> {
        let request = build_search_request(form, self.shortlist_size);
        let payload = self.client.orchestrate(&request).await?;
        let result = normalize(payload)?;
        Ok(self.commit(result))
    }

    /// Upload-and-parse protocol over files on disk.
    pub async fn upload(&mut self, paths: &[PathBuf]) -> Result<&SearchResult> {
        let files = ResumeFile::read_all(paths).await?;
        let payload = self.client.upload_and_parse(files).await?;
        let result = normalize(payload)?;
        Ok(self.commit(result))
    }

    fn commit(&mut self, result: SearchResult) -> &SearchResult {
        info!(
            mode = ?result.mode,
            candidates = result.total_candidates_found,
            "replacing current result"
        );
        if let Some(path) = &self.store {
            if let Err(e) = save_result(path, &result) {
                warn!("Failed to save current result to {}: {}", path.display(), e);
            }
        }
        self.current.insert(result)
    }
}

/// Writes to a sibling temp file first so a reader never sees half a result.
pub fn save_result(path: &Path, result: &SearchResult) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_vec_pretty(result)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json)?;
    fs::rename(&tmp, path)
}

/// Loads the last saved result, if there is one.
pub fn load_result(path: &Path) -> Result<Option<SearchResult>> {
    let raw = match fs::read(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ClientError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    serde_json::from_slice(&raw).map(Some).map_err(|e| ClientError::Io {
        path: path.to_path_buf(),
        source: io::Error::new(io::ErrorKind::InvalidData, e),
    })
}
