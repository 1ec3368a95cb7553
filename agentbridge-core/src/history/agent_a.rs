use std::fs;
use std::path::Path;
use std::path::PathBuf;

use agentbridge_types::NormalizedEvent;
use agentbridge_types::SessionError;
use agentbridge_types::SessionRecord;
use chrono::DateTime;
use chrono::Utc;

use crate::codec::CodecContext;
use crate::codec::CodecItem;
use crate::codec::agent_a as codec;
use crate::path_encode::encode_project_dir;

const ROOT_DIR: &str = ".agent-a";

fn project_dir(home: &Path, project_directory: &Path) -> PathBuf {
    home.join(ROOT_DIR)
        .join("projects")
        .join(encode_project_dir(project_directory))
}

pub fn read_history(
    home: &Path,
    project_directory: &Path,
    session_id: &str,
) -> Result<Vec<NormalizedEvent>, SessionError> {
    let path = project_dir(home, project_directory).join(format!("{session_id}.jsonl"));
    let contents = fs::read_to_string(&path)?;
    let mut turn_id = 0u64;
    let mut events = Vec::new();
    for line in contents.lines() {
        let trimmed = line.trim_start();
        if trimmed.is_empty() || !trimmed.starts_with('{') {
            continue;
        }
        let value: serde_json::Value = serde_json::from_str(trimmed)?;
        let ctx = CodecContext {
            session_id: session_id.to_string(),
            turn_id,
        };
        let decoded = codec::decode(&value, &ctx)?;
        for item in decoded.items {
            if let CodecItem::Event(event) = item {
                if event.is_terminal() {
                    turn_id += 1;
                }
                events.push(event);
            }
        }
    }
    Ok(events)
}

pub fn list_sessions(
    home: &Path,
    project_directory: &Path,
) -> Result<Vec<SessionRecord>, SessionError> {
    let dir = project_dir(home, project_directory);
    let entries = match fs::read_dir(&dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(SessionError::Io(err)),
    };

    let mut records = Vec::new();
    for entry in entries {
        let entry = entry?;
        let file_name = entry.file_name();
        let name = file_name.to_string_lossy();
        if name.starts_with("agent-") || !name.ends_with(".jsonl") {
            continue;
        }
        let session_id = name.trim_end_matches(".jsonl").to_string();
        let metadata = entry.metadata()?;
        let last_updated_at: Option<DateTime<Utc>> = metadata.modified().ok().map(DateTime::from);
        records.push(SessionRecord {
            session_id,
            created_at: None,
            last_updated_at,
            project_directory: Some(project_directory.to_path_buf()),
            branch: None,
            message_count: None,
        });
    }
    Ok(records)
}
