use crate::files::{read_json, write_json, DocumentFile};
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use quire_editor::{Editor, EditorConfig};
use quire_model::Operation;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Args)]
pub struct ApplyArgs {
    /// Document JSON, optionally with a `selection`
    pub document: PathBuf,

    /// JSON array of operations
    pub operations: PathBuf,

    /// Leave the result unnormalized
    #[arg(long)]
    pub no_normalize: bool,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

pub fn apply(args: ApplyArgs, cwd: &Path) -> Result<()> {
    let mut config = EditorConfig::load(cwd)?;
    if args.no_normalize {
        config.normalize.enabled = false;
    }

    let file: DocumentFile = read_json(&args.document)?;
    let log: Vec<Operation> = read_json(&args.operations)?;
    let result = replay(file, &log, config)?;
    write_json(&result, args.out.as_deref())?;

    eprintln!(
        "{} Applied {} operations",
        "✓".green(),
        log.len().to_string().bold()
    );
    Ok(())
}

/// Apply `log` in order, stopping at the first operation that fails.
pub fn replay(file: DocumentFile, log: &[Operation], config: EditorConfig) -> Result<DocumentFile> {
    let mut builder = Editor::builder().document(file.document).config(config);
    if let Some(selection) = file.selection {
        builder = builder.selection(selection);
    }
    let mut editor = builder.build();

    for (index, op) in log.iter().enumerate() {
        debug!(index, op = op.kind(), "replaying");
        editor
            .apply(op.clone())
            .with_context(|| format!("operation {index} ({}) failed", op.kind()))?;
    }

    Ok(DocumentFile {
        document: editor.document().clone(),
        selection: editor.selection().cloned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn file(value: serde_json::Value) -> DocumentFile {
        serde_json::from_value(value).unwrap()
    }

    fn log(value: serde_json::Value) -> Vec<Operation> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_replay_normalizes() {
        let doc = file(json!({ "children": [
            { "children": [{ "text": "one" }] },
            { "children": [{ "text": "two" }] }
        ] }));
        let ops = log(json!([
            { "type": "move_node", "path": [1, 0], "newPath": [0, 1] }
        ]));

        let result = replay(doc, &ops, EditorConfig::default()).unwrap();
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({ "children": [
                { "children": [{ "text": "onetwo" }] },
                { "children": [{ "text": "" }] }
            ] })
        );
    }

    #[test]
    fn test_replay_without_normalizing() {
        let doc = file(json!({ "children": [{ "children": [{ "text": "a" }] }] }));
        let ops = log(json!([
            { "type": "insert_node", "path": [0, 1], "node": { "text": "b" } }
        ]));
        let mut config = EditorConfig::default();
        config.normalize.enabled = false;

        let result = replay(doc, &ops, config).unwrap();
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({ "children": [{ "children": [{ "text": "a" }, { "text": "b" }] }] })
        );
    }

    #[test]
    fn test_replay_carries_selection() {
        let doc = file(json!({
            "children": [{ "children": [{ "text": "ab" }] }],
            "selection": {
                "anchor": { "path": [0, 0], "offset": 2 },
                "focus": { "path": [0, 0], "offset": 2 }
            }
        }));
        let ops = log(json!([
            { "type": "insert_text", "path": [0, 0], "offset": 0, "text": "x" }
        ]));

        let result = replay(doc, &ops, EditorConfig::default()).unwrap();
        let selection = result.selection.unwrap();
        assert_eq!(selection.anchor.offset, 3);
        assert_eq!(selection.focus.offset, 3);
    }

    #[test]
    fn test_replay_reports_failing_index() {
        let doc = file(json!({ "children": [{ "children": [{ "text": "a" }] }] }));
        let ops = log(json!([
            { "type": "insert_text", "path": [0, 0], "offset": 1, "text": "b" },
            { "type": "remove_text", "path": [0, 0], "offset": 0, "text": "zz" }
        ]));

        let err = replay(doc, &ops, EditorConfig::default()).unwrap_err();
        assert!(format!("{err}").contains("operation 1 (remove_text)"));
    }
}
