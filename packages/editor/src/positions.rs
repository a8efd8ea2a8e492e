//! Caret positions across a location.
//!
//! Movement is measured against the text of each block, so a unit like a
//! word may span several leaves. Character steps follow extended grapheme
//! clusters; word steps skip leading punctuation and whitespace, then take
//! one run of word characters.

use crate::editor::Editor;
use crate::errors::EditorResult;
use crate::location::{Location, NodeQuery, StepOptions, Unit};
use quire_model::path;
use quire_model::text::{byte_index, char_len};
use quire_model::{Point, Range};
use unicode_segmentation::UnicodeSegmentation;

impl Editor {
    /// Every position reachable from the start (or end, when reversed) of
    /// `at` in steps of `options.unit`. Void elements contribute their start
    /// point once; inline element boundaries are not positions of their own.
    pub fn positions(&self, at: Option<Location>, options: StepOptions) -> EditorResult<Vec<Point>> {
        let Some(at) = self.resolve_at(at.as_ref()) else {
            return Ok(Vec::new());
        };
        let reverse = options.reverse;
        let (start, end) = self.range(at.clone(), None)?.edges();
        let first = if reverse { &end } else { &start };

        let mut out = Vec::new();
        // Unconsumed text of the current block, from the walking edge.
        let mut block_text = String::new();
        let mut is_new_block = false;
        let mut distance: isize = 0;

        let entries = self.nodes(&NodeQuery {
            at: Some(at),
            reverse,
            voids: options.voids,
            ..NodeQuery::default()
        })?;

        for (node, p) in entries {
            if let Some(element) = node.as_element() {
                if !options.voids && self.is_void(element) {
                    out.push(self.start(p)?);
                    continue;
                }
                if self.is_inline(element) {
                    continue;
                }
                if self.has_inlines(element) {
                    let e = if path::is_ancestor(&p, &end.path) {
                        end.clone()
                    } else {
                        self.end(p.clone())?
                    };
                    let s = if path::is_ancestor(&p, &start.path) {
                        start.clone()
                    } else {
                        self.start(p.clone())?
                    };
                    block_text = self.string(Range::new(s, e), options.voids)?;
                    is_new_block = true;
                }
            }

            let Some(text) = node.as_text() else {
                continue;
            };
            let len = text.char_len() as isize;
            let is_first = p == first.path;
            let (mut leaf_offset, mut leaf_remaining) = if is_first {
                let offset = first.offset as isize;
                (offset, if reverse { offset } else { len - offset })
            } else {
                (if reverse { len } else { 0 }, len)
            };

            if is_first || is_new_block || options.unit == Unit::Offset {
                out.push(Point::new(p.clone(), leaf_offset as usize));
                is_new_block = false;
            }

            loop {
                if distance == 0 {
                    if block_text.is_empty() {
                        break;
                    }
                    let step = unit_distance(&block_text, options.unit, reverse);
                    consume(&mut block_text, step, reverse);
                    distance = step as isize;
                }

                leaf_offset = if reverse {
                    leaf_offset - distance
                } else {
                    leaf_offset + distance
                };
                leaf_remaining -= distance;

                // The step runs past this leaf; carry the rest into the next.
                if leaf_remaining < 0 {
                    distance = -leaf_remaining;
                    break;
                }

                distance = 0;
                out.push(Point::new(p.clone(), leaf_offset as usize));
            }
        }

        Ok(out)
    }
}

/// Drop `count` characters from the walking edge of `text`.
fn consume(text: &mut String, count: usize, reverse: bool) {
    if reverse {
        let keep = char_len(text).saturating_sub(count);
        text.truncate(byte_index(text, keep));
    } else {
        let cut = byte_index(text, count);
        text.drain(..cut);
    }
}

/// Length in characters of the next `unit` of `text`.
fn unit_distance(text: &str, unit: Unit, reverse: bool) -> usize {
    match unit {
        Unit::Offset => 1,
        Unit::Character => character_distance(text, reverse),
        Unit::Word => word_distance(text, reverse),
        Unit::Line | Unit::Block => char_len(text),
    }
}

fn character_distance(text: &str, reverse: bool) -> usize {
    let cluster = if reverse {
        text.graphemes(true).next_back()
    } else {
        text.graphemes(true).next()
    };
    cluster.map(char_len).unwrap_or(0)
}

fn word_distance(text: &str, reverse: bool) -> usize {
    let clusters: Vec<&str> = if reverse {
        text.graphemes(true).rev().collect()
    } else {
        text.graphemes(true).collect()
    };

    let mut distance = 0;
    let mut started = false;
    for (i, cluster) in clusters.iter().enumerate() {
        let word = is_word_cluster(cluster)
            || (started && is_joiner(cluster) && clusters.get(i + 1).is_some_and(|c| is_word_cluster(c)));
        if word {
            started = true;
        } else if started {
            break;
        }
        distance += char_len(cluster);
    }
    distance
}

fn is_word_cluster(cluster: &str) -> bool {
    cluster
        .chars()
        .next()
        .is_some_and(|c| c.is_alphanumeric() || c == '_')
}

/// Apostrophes keep contractions like "can't" together.
fn is_joiner(cluster: &str) -> bool {
    matches!(cluster, "'" | "\u{2019}")
}
