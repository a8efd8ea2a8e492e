//! Text leaf helpers: character-offset slicing, equality and decorations.
//!
//! Offsets throughout the model count Unicode scalar values, not bytes.

use crate::node::{Properties, Text};
use crate::range::Range;
use serde::{Deserialize, Serialize};

/// Number of characters in `text`.
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Byte index of character `offset`, clamped to the end of the string.
pub fn byte_index(text: &str, offset: usize) -> usize {
    text.char_indices()
        .nth(offset)
        .map(|(i, _)| i)
        .unwrap_or(text.len())
}

/// Characters `start..end` of `text`.
pub fn slice_chars(text: &str, start: usize, end: usize) -> &str {
    let from = byte_index(text, start);
    let to = byte_index(text, end.max(start));
    &text[from..to]
}

/// A range carrying extra properties to layer onto the text it covers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decoration {
    pub range: Range,
    #[serde(default)]
    pub properties: Properties,
}

impl Text {
    pub fn char_len(&self) -> usize {
        char_len(&self.text)
    }

    /// Same marks, ignoring the text content.
    pub fn loose_eq(&self, other: &Text) -> bool {
        self.marks == other.marks
    }

    /// Whether every given property is present with the same value.
    pub fn matches(&self, props: &Properties) -> bool {
        props.iter().all(|(k, v)| {
            if k == "text" {
                v.as_str() == Some(self.text.as_str())
            } else {
                self.marks.get(k) == Some(v)
            }
        })
    }

    /// Split this leaf into pieces at every decoration edge, applying each
    /// decoration's properties to the pieces it covers. Only the offsets of
    /// the decoration ranges are consulted.
    pub fn decorations(&self, decorations: &[Decoration]) -> Vec<Text> {
        let mut leaves = vec![self.clone()];

        for decoration in decorations {
            let (start, end) = decoration.range.edges();
            let (dec_start, dec_end) = (start.offset, end.offset);
            let mut next = Vec::with_capacity(leaves.len() + 2);
            let mut leaf_end = 0;

            for mut leaf in leaves {
                let len = leaf.char_len();
                let leaf_start = leaf_end;
                leaf_end += len;

                if dec_start <= leaf_start && leaf_end <= dec_end {
                    apply_marks(&mut leaf, &decoration.properties);
                    next.push(leaf);
                    continue;
                }

                if (dec_start != dec_end && (dec_start == leaf_end || dec_end == leaf_start))
                    || dec_start > leaf_end
                    || dec_end < leaf_start
                    || (dec_end == leaf_start && leaf_start != 0)
                {
                    next.push(leaf);
                    continue;
                }

                // Split the end first so the start offset stays valid.
                let mut middle = leaf;
                let mut before = None;
                let mut after = None;

                if dec_end < leaf_end {
                    let at = dec_end - leaf_start;
                    let mut tail = middle.clone();
                    tail.text = slice_chars(&middle.text, at, len).to_string();
                    middle.text = slice_chars(&middle.text, 0, at).to_string();
                    after = Some(tail);
                }

                if dec_start > leaf_start {
                    let at = dec_start - leaf_start;
                    let mut head = middle.clone();
                    head.text = slice_chars(&middle.text, 0, at).to_string();
                    middle.text = slice_chars(&middle.text, at, usize::MAX).to_string();
                    before = Some(head);
                }

                apply_marks(&mut middle, &decoration.properties);
                next.extend(before);
                next.push(middle);
                next.extend(after);
            }

            leaves = next;
        }

        leaves
    }
}

fn apply_marks(leaf: &mut Text, properties: &Properties) {
    for (k, v) in properties {
        leaf.marks.insert(k.clone(), v.clone());
    }
}
