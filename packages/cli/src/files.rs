use anyhow::{anyhow, Context, Result};
use quire_model::{Document, Point, Range};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// A document on disk, optionally carrying a selection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentFile {
    #[serde(flatten)]
    pub document: Document,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection: Option<Range>,
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content =
        fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("cannot parse {}", path.display()))
}

/// Pretty-print `value` to `out`, or to stdout when absent.
pub fn write_json<T: Serialize>(value: &T, out: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    match out {
        Some(path) => {
            fs::write(path, json + "\n").with_context(|| format!("cannot write {}", path.display()))
        }
        None => {
            println!("{json}");
            Ok(())
        }
    }
}

/// Parse a point written as `PATH:OFFSET`, with path indices separated by
/// dots: `0.1:4`.
pub fn parse_point(input: &str) -> Result<Point> {
    let (path, offset) = input
        .rsplit_once(':')
        .ok_or_else(|| anyhow!("expected PATH:OFFSET, got {input:?}"))?;
    let path = path
        .split('.')
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<usize>()
                .with_context(|| format!("invalid path index {part:?} in {input:?}"))
        })
        .collect::<Result<Vec<_>>>()?;
    if path.is_empty() {
        return Err(anyhow!("a point needs a non-empty path, got {input:?}"));
    }
    let offset = offset
        .parse::<usize>()
        .with_context(|| format!("invalid offset in {input:?}"))?;
    Ok(Point::new(path, offset))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_point() {
        assert_eq!(parse_point("0.1:4").unwrap(), Point::new(vec![0, 1], 4));
        assert_eq!(parse_point("3:0").unwrap(), Point::new(vec![3], 0));
        assert!(parse_point("0.1").is_err());
        assert!(parse_point(":2").is_err());
        assert!(parse_point("0.x:2").is_err());
        assert!(parse_point("0:-1").is_err());
    }

    #[test]
    fn test_document_file_selection_is_optional() {
        let file: DocumentFile = serde_json::from_value(json!({
            "children": [{ "children": [{ "text": "a" }] }]
        }))
        .unwrap();
        assert_eq!(file.selection, None);
        assert_eq!(file.document.children.len(), 1);

        let value = serde_json::to_value(&file).unwrap();
        assert!(value.get("selection").is_none());
    }
}
