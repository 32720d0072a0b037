//! Subcommand execution.
//!
//! Every subcommand maps one JSON document to another, so the binary only
//! has to read input, call [`execute`] and [`render`] the result.

use std::io;
use std::path::Path;

use mockshape_core::error::Result;
use mockshape_core::{
    flatten, properties_to_chunks, unflatten, Chunk, Config, ExampleValues, MockSynthesizer,
    PropertiesMap,
};
use serde_json::Value;
use tracing::debug;

use crate::cli::Command;

/// Runs `command` against an already parsed input document.
///
/// # Errors
///
/// Returns an error when the input has the wrong shape for the subcommand
/// or the core transform rejects it.
pub fn execute(command: &Command, config: &Config, input: Value) -> Result<Value> {
    debug!(command = command.name(), "Executing command");
    match command {
        Command::Flatten(_) => Ok(serde_json::to_value(flatten(&input))?),
        Command::Unflatten(_) => {
            let chunks: Vec<Chunk> = serde_json::from_value(input)?;
            Ok(unflatten(&chunks)?)
        }
        Command::Collapse(_) => Ok(config.collapser().collapse(&input)),
        Command::Describe(_) => {
            let properties = MockSynthesizer::from_config(config, ExampleValues).describe(&input)?;
            Ok(serde_json::to_value(properties)?)
        }
        Command::Chunks(_) => {
            let properties: PropertiesMap = serde_json::from_value(input)?;
            Ok(serde_json::to_value(properties_to_chunks(&properties))?)
        }
        Command::Mock(_) => {
            Ok(MockSynthesizer::from_config(config, ExampleValues).synthesize(&input)?)
        }
    }
}

/// Reads a JSON document from `path`, or stdin when `path` is `None` or `-`.
///
/// # Errors
///
/// Returns an error if the source cannot be read or is not valid JSON.
pub fn read_input(path: Option<&Path>) -> Result<Value> {
    match path {
        Some(path) if path != Path::new("-") => {
            let content = std::fs::read_to_string(path)?;
            Ok(serde_json::from_str(&content)?)
        }
        _ => Ok(serde_json::from_reader(io::stdin().lock())?),
    }
}

/// Serializes `value` for printing.
///
/// # Errors
///
/// Returns an error if the value cannot be serialized.
pub fn render(value: &Value, compact: bool) -> Result<String> {
    if compact {
        Ok(serde_json::to_string(value)?)
    } else {
        Ok(serde_json::to_string_pretty(value)?)
    }
}

/// Loads the configuration named on the command line, or the per-user file
/// when present, or defaults.
///
/// # Errors
///
/// Returns an error if an explicitly named file is missing, or any loaded
/// file is invalid.
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    if let Some(path) = explicit {
        return Ok(Config::load(path)?);
    }
    match Config::default_path() {
        Some(path) => Ok(Config::load_or_default(&path)?),
        None => Ok(Config::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::InputArgs;
    use mockshape_core::MockshapeError;
    use serde_json::json;
    use tempfile::TempDir;

    fn run(command: fn(InputArgs) -> Command, input: Value) -> Result<Value> {
        execute(&command(InputArgs::default()), &Config::default(), input)
    }

    fn schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "id": { "type": "integer", "description": "Customer id", "format": "int64" },
                "email": { "type": "string", "example": "jane@example.com" }
            }
        })
    }

    #[test]
    fn test_flatten_then_unflatten() {
        let value = json!({ "name": "John", "children": [], "parents": {} });
        let chunks = run(Command::Flatten, value.clone()).unwrap();
        assert_eq!(
            chunks,
            json!([
                { "path": ["name"], "data": "John" },
                { "path": ["children"], "data": [] },
                { "path": ["parents"], "data": {} }
            ])
        );
        assert_eq!(run(Command::Unflatten, chunks).unwrap(), value);
    }

    #[test]
    fn test_unflatten_rejects_non_chunk_input() {
        let err = run(Command::Unflatten, json!({ "not": "chunks" })).unwrap_err();
        assert!(matches!(err, MockshapeError::InvalidJson(_)));
    }

    #[test]
    fn test_unflatten_reports_conflicts() {
        let chunks = json!([
            { "path": ["a", 0], "data": 1 },
            { "path": ["a", "b"], "data": 2 }
        ]);
        let err = run(Command::Unflatten, chunks).unwrap_err();
        assert_eq!(err.error_code(), "STRUCTURAL_CONFLICT");
    }

    #[test]
    fn test_unflatten_rejects_oversized_index() {
        let chunks = json!([{ "path": ["a", 50_000_000], "data": 1 }]);
        let err = run(Command::Unflatten, chunks).unwrap_err();
        assert_eq!(err.error_code(), "INDEX_OUT_OF_RANGE");
    }

    #[test]
    fn test_mock_picks_first_enum_value() {
        let schema = json!({
            "properties": { "status": { "type": "string", "enum": ["open", "closed"] } }
        });
        assert_eq!(run(Command::Mock, schema).unwrap(), json!({ "status": "open" }));
    }

    #[test]
    fn test_collapse() {
        let collapsed = run(Command::Collapse, schema()).unwrap();
        assert_eq!(collapsed["type"], json!("object"));
        assert_eq!(collapsed["email"]["example"], json!("jane@example.com"));
        assert!(collapsed.get("properties").is_none());
    }

    #[test]
    fn test_describe_and_expand_chunks() {
        let properties = run(Command::Describe, schema()).unwrap();
        assert_eq!(
            properties["id"],
            json!({ "path": ["id"], "description": "Customer id", "type": "integer" })
        );

        let chunks = run(Command::Chunks, properties).unwrap();
        let chunks = chunks.as_array().unwrap();
        assert_eq!(chunks.len(), 5);
        assert!(chunks.contains(&json!({ "path": ["email", "example"], "data": "jane@example.com" })));
    }

    #[test]
    fn test_mock_uses_configured_allow_list() {
        let mut config = Config::default();
        config.merge.descriptor_attributes = vec!["type".to_string()];

        let response = execute(
            &Command::Mock(InputArgs::default()),
            &config,
            schema(),
        )
        .unwrap();
        // Without `example` in the allow-list the email falls back to its type.
        assert_eq!(response, json!({ "id": 0, "email": "string" }));
        assert_eq!(
            run(Command::Mock, schema()).unwrap(),
            json!({ "id": 0, "email": "jane@example.com" })
        );
    }

    #[test]
    fn test_render_modes() {
        let value = json!({ "a": [1, 2] });
        assert_eq!(render(&value, true).unwrap(), r#"{"a":[1,2]}"#);
        assert!(render(&value, false).unwrap().contains('\n'));
    }

    #[test]
    fn test_read_input_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("input.json");
        std::fs::write(&path, r#"{ "id": 1 }"#).unwrap();
        assert_eq!(read_input(Some(&path)).unwrap(), json!({ "id": 1 }));

        std::fs::write(&path, "{ broken").unwrap();
        assert!(matches!(
            read_input(Some(&path)),
            Err(MockshapeError::InvalidJson(_))
        ));

        let missing = dir.path().join("missing.json");
        assert!(read_input(Some(&missing)).unwrap_err().is_io_error());
    }

    #[test]
    fn test_load_explicit_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        let err = load_config(Some(&path)).unwrap_err();
        assert!(matches!(err, MockshapeError::ConfigNotFound(_)));

        std::fs::write(&path, "[envelope]\nkeys = [\"fields\"]\n").unwrap();
        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.envelope.keys, vec!["fields"]);
    }
}
