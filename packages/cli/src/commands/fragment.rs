use crate::files::{parse_point, read_json, write_json, DocumentFile};
use anyhow::Result;
use clap::Args;
use quire_editor::Editor;
use quire_model::{Node, Range};
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct FragmentArgs {
    /// Document JSON
    pub document: PathBuf,

    /// Start point as PATH:OFFSET, e.g. 0.0:2
    #[arg(long)]
    pub anchor: String,

    /// End point as PATH:OFFSET
    #[arg(long)]
    pub focus: String,
}

/// Both points must land on existing text leaves.
pub fn extract(file: DocumentFile, range: Range) -> Result<Vec<Node>> {
    let editor = Editor::new(file.document);
    for point in range.points() {
        editor.leaf(point.clone(), None)?;
    }
    Ok(editor.fragment(range)?)
}

pub fn fragment(args: FragmentArgs) -> Result<()> {
    let range = Range::new(parse_point(&args.anchor)?, parse_point(&args.focus)?);
    let file: DocumentFile = read_json(&args.document)?;
    write_json(&extract(file, range)?, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use quire_model::Point;
    use serde_json::json;

    #[test]
    fn test_extract_across_blocks() {
        let file: DocumentFile = serde_json::from_value(json!({ "children": [
            { "children": [{ "text": "one" }] },
            { "children": [{ "text": "two" }] }
        ] }))
        .unwrap();
        let range = Range::new(Point::new(vec![1, 0], 1), Point::new(vec![0, 0], 2));

        let nodes = extract(file, range).unwrap();
        assert_eq!(
            serde_json::to_value(&nodes).unwrap(),
            json!([
                { "children": [{ "text": "e" }] },
                { "children": [{ "text": "t" }] }
            ])
        );
    }

    #[test]
    fn test_extract_unresolved_point_fails() {
        let file = DocumentFile::default();
        let range = Range::collapsed(Point::new(vec![4, 0], 0));
        assert!(extract(file, range).is_err());
    }
}
