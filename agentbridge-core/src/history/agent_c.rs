use std::fs;
use std::path::Path;
use std::path::PathBuf;

use agentbridge_types::NormalizedEvent;
use agentbridge_types::SessionError;
use agentbridge_types::SessionRecord;
use agentbridge_types::TurnStatus;
use agentbridge_types::event::EventKind;
use chrono::DateTime;
use chrono::Utc;
use serde_json::Value;

use crate::path_encode::hash_project_dir;

const ROOT_DIR: &str = ".agent-c";

fn chats_dir(home: &Path, project_directory: &Path) -> PathBuf {
    home.join(ROOT_DIR)
        .join(hash_project_dir(project_directory))
        .join("chats")
}

/// Scans `chats_dir` for the document whose embedded `sessionId` matches,
/// the same way `list_sessions` enumerates them — the on-disk filename is
/// an opaque uuid, not necessarily the agent-assigned session id.
fn find_session_document(
    home: &Path,
    project_directory: &Path,
    session_id: &str,
) -> Result<Value, SessionError> {
    let dir = chats_dir(home, project_directory);
    let entries = match fs::read_dir(&dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(SessionError::NotFound(session_id.to_string()));
        }
        Err(err) => return Err(SessionError::Io(err)),
    };

    for entry in entries {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        let Some(uuid) = name.strip_suffix(".json") else {
            continue;
        };
        let contents = fs::read_to_string(entry.path())?;
        let document: Value = serde_json::from_str(&contents)?;
        let document_session_id = document
            .get("sessionId")
            .and_then(Value::as_str)
            .unwrap_or(uuid);
        if document_session_id == session_id {
            return Ok(document);
        }
    }
    Err(SessionError::NotFound(session_id.to_string()))
}

pub fn read_history(
    home: &Path,
    project_directory: &Path,
    session_id: &str,
) -> Result<Vec<NormalizedEvent>, SessionError> {
    let document = find_session_document(home, project_directory, session_id)?;
    let messages = document
        .get("messages")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    let mut events = Vec::new();
    let mut turn_id = 0u64;
    for message in &messages {
        let role = message.get("role").and_then(Value::as_str).unwrap_or("");
        let text = message
            .get("content")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let timestamp = message
            .get("timestamp")
            .and_then(Value::as_str)
            .and_then(|s| chrono::DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc));

        if role == "user" {
            continue;
        }
        events.push(NormalizedEvent {
            session_id: session_id.to_string(),
            turn_id,
            timestamp,
            kind: EventKind::Text {
                text,
                is_partial: false,
            },
        });
        if role == "assistant" {
            events.push(NormalizedEvent {
                session_id: session_id.to_string(),
                turn_id,
                timestamp,
                kind: EventKind::TurnEnd {
                    status: TurnStatus::Success,
                    usage: None,
                    duration_ms: None,
                    error_message: None,
                },
            });
            turn_id += 1;
        }
    }
    Ok(events)
}

pub fn list_sessions(
    home: &Path,
    project_directory: &Path,
) -> Result<Vec<SessionRecord>, SessionError> {
    let dir = chats_dir(home, project_directory);
    let entries = match fs::read_dir(&dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(SessionError::Io(err)),
    };

    let mut records = Vec::new();
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        let Some(uuid) = name.strip_suffix(".json") else {
            continue;
        };
        let contents = fs::read_to_string(entry.path())?;
        let document: Value = serde_json::from_str(&contents)?;
        let session_id = document
            .get("sessionId")
            .and_then(Value::as_str)
            .unwrap_or(uuid)
            .to_string();
        let metadata = entry.metadata()?;
        let last_updated_at: Option<DateTime<Utc>> = metadata.modified().ok().map(DateTime::from);
        records.push(SessionRecord {
            session_id,
            created_at: None,
            last_updated_at,
            project_directory: Some(project_directory.to_path_buf()),
            branch: None,
            message_count: document
                .get("messages")
                .and_then(Value::as_array)
                .map(|arr| arr.len() as u64),
        });
    }
    Ok(records)
}
