use async_trait::async_trait;
use parley_core::{ParleyError, ParleyResult, Role, SessionId};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::debug;

// ---------------------------------------------------------------------------
// TranscriptRecord
// ---------------------------------------------------------------------------

/// One side of a chat turn, serialized as a single JSON line
/// `{"role": "user"|"agent", "text": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TranscriptRecord {
    /// Who produced the text.
    pub role: Role,
    /// The message or reply exactly as shown to the user.
    pub text: String,
}

impl TranscriptRecord {
    /// Creates a record for the given role.
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
        }
    }

    /// Creates a [`Role::User`] record.
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    /// Creates a [`Role::Agent`] record.
    pub fn agent(text: impl Into<String>) -> Self {
        Self::new(Role::Agent, text)
    }
}

// ---------------------------------------------------------------------------
// TranscriptStore trait
// ---------------------------------------------------------------------------

/// Append-only transcript storage keyed by session.
///
/// Records of one session come back from [`read`](TranscriptStore::read) in
/// the order they were appended. Nothing is ever rewritten or deleted.
#[async_trait]
pub trait TranscriptStore: Send + Sync {
    /// Appends one record to the session's transcript, creating it if needed.
    async fn append(&self, session_id: &SessionId, role: Role, text: &str) -> ParleyResult<()>;

    /// Reads every record of a session; empty if the session has none.
    async fn read(&self, session_id: &SessionId) -> ParleyResult<Vec<TranscriptRecord>>;
}

// ---------------------------------------------------------------------------
// FileTranscriptStore
// ---------------------------------------------------------------------------

/// Stores each session as `<dir>/<session_id>.jsonl`.
///
/// Every append opens the file, writes one line, flushes and closes it again;
/// no handle is held between calls.
pub struct FileTranscriptStore {
    dir: PathBuf,
}

impl FileTranscriptStore {
    /// Opens (and creates, if missing) the transcript directory.
    pub async fn new(dir: PathBuf) -> ParleyResult<Self> {
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    /// The directory transcripts are written to.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the transcript file for a session.
    pub fn transcript_path(&self, session_id: &SessionId) -> PathBuf {
        self.dir.join(format!("{session_id}.jsonl"))
    }
}

#[async_trait]
impl TranscriptStore for FileTranscriptStore {
    async fn append(&self, session_id: &SessionId, role: Role, text: &str) -> ParleyResult<()> {
        let path = self.transcript_path(session_id);
        let mut line = serde_json::to_string(&TranscriptRecord::new(role, text))?;
        line.push('\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        debug!(session_id = %session_id, role = %role, bytes = line.len(), "Transcript record appended");
        Ok(())
    }

    async fn read(&self, session_id: &SessionId) -> ParleyResult<Vec<TranscriptRecord>> {
        let path = self.transcript_path(session_id);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let data = tokio::fs::read_to_string(&path).await?;
        data.lines()
            .enumerate()
            .filter(|(_, l)| !l.trim().is_empty())
            .map(|(i, l)| {
                serde_json::from_str(l).map_err(|e| {
                    ParleyError::Session(format!(
                        "{}:{}: malformed transcript record: {e}",
                        path.display(),
                        i + 1
                    ))
                })
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn temp_store() -> (FileTranscriptStore, TempDir) {
        let tmp = TempDir::new().unwrap();
        let store = FileTranscriptStore::new(tmp.path().to_path_buf())
            .await
            .unwrap();
        (store, tmp)
    }

    #[tokio::test]
    async fn append_and_read_round_trip() {
        let (store, _tmp) = temp_store().await;
        let sid = SessionId::generate();

        store.append(&sid, Role::User, "hello").await.unwrap();

        let records = store.read(&sid).await.unwrap();
        assert_eq!(records, vec![TranscriptRecord::user("hello")]);
    }

    #[tokio::test]
    async fn empty_transcript_returns_empty_vec() {
        let (store, _tmp) = temp_store().await;
        let records = store.read(&SessionId::generate()).await.unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn file_is_named_after_session() {
        let (store, tmp) = temp_store().await;
        let sid = SessionId::parse("my-session").unwrap();

        store.append(&sid, Role::Agent, "hi").await.unwrap();

        assert!(tmp.path().join("my-session.jsonl").is_file());
        assert_eq!(store.transcript_path(&sid), tmp.path().join("my-session.jsonl"));
    }

    #[tokio::test]
    async fn one_line_per_record() {
        let (store, _tmp) = temp_store().await;
        let sid = SessionId::generate();

        store.append(&sid, Role::User, "line one\nline two").await.unwrap();
        store.append(&sid, Role::Agent, "reply").await.unwrap();

        let raw = std::fs::read_to_string(store.transcript_path(&sid)).unwrap();
        assert_eq!(raw.lines().count(), 2);
        assert!(raw.ends_with('\n'));
        assert_eq!(
            raw.lines().next().unwrap(),
            r#"{"role":"user","text":"line one\nline two"}"#
        );
    }

    #[tokio::test]
    async fn malformed_line_reports_location() {
        let (store, _tmp) = temp_store().await;
        let sid = SessionId::generate();
        store.append(&sid, Role::User, "ok").await.unwrap();
        std::fs::write(
            store.transcript_path(&sid),
            "{\"role\":\"user\",\"text\":\"ok\"}\n{broken\n",
        )
        .unwrap();

        let err = store.read(&sid).await.unwrap_err();
        assert!(matches!(err, ParleyError::Session(_)));
        assert!(err.to_string().contains(":2:"));
    }

    #[test]
    fn record_rejects_extra_keys() {
        let res = serde_json::from_str::<TranscriptRecord>(
            r#"{"role":"user","text":"x","timestamp":1}"#,
        );
        assert!(res.is_err());
    }
}
