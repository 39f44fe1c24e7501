//! Command handlers
//!
//! Each handler returns a JSON value on success; failures bubble up as
//! [`NotesError`] and are turned into `{"status":"error",...}` objects by
//! [`handle`].

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use super::request::{required, AddArgs, AppendArgs, CleanIndexArgs, MigrateArgs, SearchArgs};
use crate::core::notebook::Notebook;
use crate::error::{NotesError, Result};

/// Commands and their one-line descriptions, in help order
pub const COMMANDS: [(&str, &str); 10] = [
    ("add", "Add a new note"),
    ("search", "Search for notes"),
    ("append", "Append an update to an existing note"),
    ("reindex", "Rebuild the search index"),
    ("clean-index", "Remove and optionally rebuild the index"),
    ("validate", "Check note files for issues"),
    ("migrate", "Import existing markdown files"),
    ("stats", "Notes statistics"),
    ("info", "Notes directory info and paths"),
    ("help", "This list"),
];

/// Handle one request object. Never fails: errors become error objects.
pub fn handle(notebook: &Notebook, request: &Value) -> Value {
    if !request.is_object() {
        return error_response(&NotesError::invalid("request must be a JSON object"));
    }
    let command = match request.get("command") {
        None => "help",
        Some(Value::String(name)) => name.as_str(),
        Some(_) => return error_response(&NotesError::invalid("command must be a string")),
    };

    debug!(command, "dispatching");
    match dispatch(notebook, command, request) {
        Ok(value) => value,
        Err(e) => {
            warn!(command, error = %e, "command failed");
            error_response(&e)
        }
    }
}

/// Route a command to its handler
pub fn dispatch(notebook: &Notebook, command: &str, args: &Value) -> Result<Value> {
    match command {
        "add" => do_add(notebook, args),
        "search" => do_search(notebook, args),
        "append" => do_append(notebook, args),
        "reindex" => success(&notebook.reindex()?),
        "stats" => success(&notebook.stats()?),
        "info" => success(&notebook.info()),
        "validate" => success(&notebook.validate()?),
        "clean-index" => do_clean_index(notebook, args),
        "migrate" => do_migrate(notebook, args),
        "help" => Ok(help()),
        other => Err(NotesError::invalid(format!(
            "unknown command '{}'; send {{\"command\":\"help\"}} for the list",
            other
        ))),
    }
}

pub fn error_response(err: &NotesError) -> Value {
    json!({
        "status": "error",
        "kind": err.kind().as_str(),
        "message": err.to_string(),
    })
}

pub fn help() -> Value {
    let commands: Map<String, Value> = COMMANDS
        .iter()
        .map(|(name, about)| (name.to_string(), Value::from(*about)))
        .collect();
    json!({
        "status": "help",
        "commands": commands,
        "usage": "echo '{\"command\":\"search\",\"query\":\"test\"}' | notes serve",
    })
}

fn parse_args<T: DeserializeOwned>(args: &Value) -> Result<T> {
    serde_json::from_value(args.clone())
        .map_err(|e| NotesError::invalid(format!("invalid params: {}", e)))
}

/// Serialize `payload` and mark it successful unless it carries a status
fn success<T: Serialize>(payload: &T) -> Result<Value> {
    let mut value = serde_json::to_value(payload)?;
    if let Value::Object(map) = &mut value {
        if !map.contains_key("status") {
            map.insert("status".to_string(), Value::from("success"));
        }
    }
    Ok(value)
}

fn do_add(notebook: &Notebook, args: &Value) -> Result<Value> {
    let args: AddArgs = parse_args(args)?;
    let heading = required(&args.heading, "heading").map_err(NotesError::invalid)?;
    let content = required(&args.content, "content").map_err(NotesError::invalid)?;
    success(&notebook.add(heading, content, args.category.as_deref())?)
}

fn do_search(notebook: &Notebook, args: &Value) -> Result<Value> {
    let args: SearchArgs = parse_args(args)?;
    let hits = notebook.search(&args.query, args.max_results)?;
    Ok(serde_json::to_value(hits)?)
}

fn do_append(notebook: &Notebook, args: &Value) -> Result<Value> {
    let args: AppendArgs = parse_args(args)?;
    let term = required(&args.search_term, "search_term").map_err(NotesError::invalid)?;
    let content = required(&args.content, "content").map_err(NotesError::invalid)?;
    success(&notebook.append(term, content)?)
}

fn do_clean_index(notebook: &Notebook, args: &Value) -> Result<Value> {
    let args: CleanIndexArgs = parse_args(args)?;
    let cleaned = notebook.clean_index(args.rebuild)?;
    let message = match (cleaned.removed, args.rebuild) {
        (true, true) => "Removed existing index and rebuilt it",
        (true, false) => "Removed existing index",
        (false, true) => "No existing index; built a fresh one",
        (false, false) => "No existing index",
    };
    Ok(json!({
        "status": "success",
        "message": message,
        "removed": cleaned.removed,
        "reindex": cleaned.reindex,
    }))
}

fn do_migrate(notebook: &Notebook, args: &Value) -> Result<Value> {
    let args: MigrateArgs = parse_args(args)?;
    let source = required(&args.source_dir, "source_dir").map_err(NotesError::invalid)?;
    success(&notebook.migrate(Path::new(source), args.recursive)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, ResolvedRoot};
    use anyhow::Result;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn notebook(dir: &TempDir) -> Notebook {
        Notebook::open(ResolvedRoot::fixed(dir.path()), Config::default())
            .with_today(NaiveDate::from_ymd_opt(2025, 11, 3).unwrap())
    }

    #[test]
    fn test_add_search_append_flow() -> Result<()> {
        let dir = TempDir::new()?;
        let nb = notebook(&dir);

        let added = handle(
            &nb,
            &json!({"command": "add", "heading": "Work - Fixed login bug", "content": "cookie"}),
        );
        assert_eq!(added["status"], "success");
        assert_eq!(added["file"], "2025/11-November.md");

        let hits = handle(&nb, &json!({"command": "search", "query": "login"}));
        assert!(hits.is_array());
        assert_eq!(hits[0]["heading"], "Work - Fixed login bug");
        assert_eq!(hits[0]["date"], "2025-11-03");

        let appended = handle(
            &nb,
            &json!({"command": "append", "search_term": "login bug", "content": "shipped"}),
        );
        assert_eq!(appended["status"], "success");
        assert_eq!(appended["alternatives"], json!([]));
        Ok(())
    }

    #[test]
    fn test_missing_fields_are_input_errors() -> Result<()> {
        let dir = TempDir::new()?;
        let nb = notebook(&dir);

        let resp = handle(&nb, &json!({"command": "add", "content": "x"}));
        assert_eq!(resp["status"], "error");
        assert_eq!(resp["kind"], "input");
        assert!(resp["message"].as_str().unwrap_or("").contains("heading"));

        let resp = handle(&nb, &json!({"command": "migrate"}));
        assert_eq!(resp["kind"], "input");

        let resp = handle(&nb, &json!({"command": "search", "max_results": "ten"}));
        assert_eq!(resp["kind"], "input");
        Ok(())
    }

    #[test]
    fn test_unknown_and_missing_command() -> Result<()> {
        let dir = TempDir::new()?;
        let nb = notebook(&dir);

        let resp = handle(&nb, &json!({"command": "explode"}));
        assert_eq!(resp["status"], "error");
        assert_eq!(resp["kind"], "input");

        let resp = handle(&nb, &json!({}));
        assert_eq!(resp["status"], "help");
        assert!(resp["commands"].get("clean-index").is_some());
        Ok(())
    }

    #[test]
    fn test_empty_search_is_success() -> Result<()> {
        let dir = TempDir::new()?;
        let nb = notebook(&dir);
        assert_eq!(handle(&nb, &json!({"command": "search", "query": "x"})), json!([]));
        Ok(())
    }

    #[test]
    fn test_append_not_found_status() -> Result<()> {
        let dir = TempDir::new()?;
        let nb = notebook(&dir);
        handle(&nb, &json!({"command": "add", "heading": "Work - A", "content": "a"}));

        let resp = handle(
            &nb,
            &json!({"command": "append", "search_term": "zzqqxx-not-present", "content": "x"}),
        );
        assert_eq!(resp["status"], "not_found");
        Ok(())
    }

    #[test]
    fn test_clean_index_and_stats() -> Result<()> {
        let dir = TempDir::new()?;
        let nb = notebook(&dir);
        handle(&nb, &json!({"command": "add", "heading": "Idea - B", "content": "b"}));

        let resp = handle(&nb, &json!({"command": "clean-index"}));
        assert_eq!(resp["removed"], true);
        assert_eq!(resp["reindex"]["total_entries"], 1);

        let stats = handle(&nb, &json!({"command": "stats"}));
        assert_eq!(stats["status"], "success");
        assert_eq!(stats["categories"]["Idea"], 1);
        Ok(())
    }

    #[test]
    fn test_migrate_missing_source() -> Result<()> {
        let dir = TempDir::new()?;
        let nb = notebook(&dir);
        let missing = dir.path().join("nope");
        let resp = handle(
            &nb,
            &json!({"command": "migrate", "source_dir": missing.to_string_lossy()}),
        );
        assert_eq!(resp["status"], "error");
        assert_eq!(resp["kind"], "input");
        Ok(())
    }
}
