//! # Paths
//!
//! A path is a list of child indexes walked down from the root. Paths are
//! plain `Vec<usize>` values; every function here borrows them as slices.
//!
//! ## Ordering
//!
//! [`compare`] is a prefix relation rather than a strict order: an ancestor
//! compares [`Ordering::Equal`] to each of its descendants. Code that needs
//! "strictly before in document order" uses [`is_before`] together with
//! [`is_ancestor`].
//!
//! ## Rebasing
//!
//! [`transform`] rebases a path across a single [`Operation`], returning
//! `None` when the node it addressed no longer exists.

use crate::error::{ModelError, ModelResult};
use crate::operation::Operation;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Child indexes from the root downward.
pub type Path = Vec<usize>;

/// Tie-break used when an edit lands exactly on a tracked position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Affinity {
    Forward,
    Backward,
}

/// All ancestors of `path`, root first, excluding `path` itself.
pub fn ancestors(path: &[usize], reverse: bool) -> Vec<Path> {
    let mut paths = levels(path, reverse);
    if reverse {
        paths.remove(0);
    } else {
        paths.pop();
    }
    paths
}

/// Every level from the root down to and including `path`.
pub fn levels(path: &[usize], reverse: bool) -> Vec<Path> {
    let mut list: Vec<Path> = (0..=path.len()).map(|i| path[..i].to_vec()).collect();
    if reverse {
        list.reverse();
    }
    list
}

/// Longest shared prefix of two paths.
pub fn common(path: &[usize], another: &[usize]) -> Path {
    path.iter()
        .zip(another.iter())
        .take_while(|(a, b)| a == b)
        .map(|(a, _)| *a)
        .collect()
}

/// Compare up to the shorter length; ancestors compare equal to descendants.
pub fn compare(path: &[usize], another: &[usize]) -> Ordering {
    for (a, b) in path.iter().zip(another.iter()) {
        match a.cmp(b) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}

fn last_step(path: &[usize], another: &[usize]) -> Option<(usize, usize)> {
    let i = path.len().checked_sub(1)?;
    if another.len() <= i || path[..i] != another[..i] {
        return None;
    }
    Some((path[i], another[i]))
}

/// `path` and `another` share `path`'s parent and `path` sits after at that depth.
pub fn ends_after(path: &[usize], another: &[usize]) -> bool {
    matches!(last_step(path, another), Some((a, b)) if a > b)
}

/// `path` and `another` share `path`'s parent and `path` sits at the same index.
pub fn ends_at(path: &[usize], another: &[usize]) -> bool {
    matches!(last_step(path, another), Some((a, b)) if a == b)
}

/// `path` and `another` share `path`'s parent and `path` sits before at that depth.
pub fn ends_before(path: &[usize], another: &[usize]) -> bool {
    matches!(last_step(path, another), Some((a, b)) if a < b)
}

pub fn equals(path: &[usize], another: &[usize]) -> bool {
    path == another
}

pub fn has_previous(path: &[usize]) -> bool {
    matches!(path.last(), Some(&index) if index > 0)
}

pub fn is_after(path: &[usize], another: &[usize]) -> bool {
    compare(path, another) == Ordering::Greater
}

pub fn is_before(path: &[usize], another: &[usize]) -> bool {
    compare(path, another) == Ordering::Less
}

pub fn is_ancestor(path: &[usize], another: &[usize]) -> bool {
    path.len() < another.len() && compare(path, another) == Ordering::Equal
}

pub fn is_child(path: &[usize], another: &[usize]) -> bool {
    path.len() == another.len() + 1 && compare(path, another) == Ordering::Equal
}

/// `path` is equal to or an ancestor of `another`.
pub fn is_common(path: &[usize], another: &[usize]) -> bool {
    path.len() <= another.len() && compare(path, another) == Ordering::Equal
}

pub fn is_descendant(path: &[usize], another: &[usize]) -> bool {
    path.len() > another.len() && compare(path, another) == Ordering::Equal
}

pub fn is_parent(path: &[usize], another: &[usize]) -> bool {
    path.len() + 1 == another.len() && compare(path, another) == Ordering::Equal
}

pub fn is_sibling(path: &[usize], another: &[usize]) -> bool {
    if path.is_empty() || path.len() != another.len() {
        return false;
    }
    let depth = path.len() - 1;
    path[..depth] == another[..depth] && path[depth] != another[depth]
}

pub fn next(path: &[usize]) -> ModelResult<Path> {
    let (last, parent) = path
        .split_last()
        .ok_or_else(|| ModelError::root_path("next sibling"))?;
    let mut next = parent.to_vec();
    next.push(last + 1);
    Ok(next)
}

pub fn previous(path: &[usize]) -> ModelResult<Path> {
    let (last, parent) = path
        .split_last()
        .ok_or_else(|| ModelError::root_path("previous sibling"))?;
    if *last == 0 {
        return Err(ModelError::NoPrevious {
            path: path.to_vec(),
        });
    }
    let mut previous = parent.to_vec();
    previous.push(last - 1);
    Ok(previous)
}

pub fn parent(path: &[usize]) -> ModelResult<Path> {
    match path.split_last() {
        Some((_, parent)) => Ok(parent.to_vec()),
        None => Err(ModelError::root_path("parent")),
    }
}

/// `path` re-expressed relative to `ancestor`.
pub fn relative(path: &[usize], ancestor: &[usize]) -> ModelResult<Path> {
    if !is_ancestor(ancestor, path) && !equals(path, ancestor) {
        return Err(ModelError::NotDescendant {
            path: path.to_vec(),
            ancestor: ancestor.to_vec(),
        });
    }
    Ok(path[ancestor.len()..].to_vec())
}

/// Whether `op` can move paths around at all.
pub fn operation_can_transform_path(op: &Operation) -> bool {
    matches!(
        op,
        Operation::InsertNode { .. }
            | Operation::RemoveNode { .. }
            | Operation::MergeNode { .. }
            | Operation::SplitNode { .. }
            | Operation::MoveNode { .. }
    )
}

/// Rebase `path` across `op`.
///
/// Returns `None` when the addressed node was removed, or when it was the
/// node being split and `affinity` is `None`.
pub fn transform(path: &[usize], op: &Operation, affinity: Option<Affinity>) -> Option<Path> {
    let mut p = path.to_vec();

    match op {
        Operation::InsertNode { path: at, .. } => {
            let Some(depth) = at.len().checked_sub(1) else {
                return Some(p);
            };
            if equals(at, &p) || ends_before(at, &p) || is_ancestor(at, &p) {
                p[depth] += 1;
            }
        }

        Operation::RemoveNode { path: at, .. } => {
            let Some(depth) = at.len().checked_sub(1) else {
                return None;
            };
            if equals(at, &p) || is_ancestor(at, &p) {
                return None;
            } else if ends_before(at, &p) {
                p[depth] -= 1;
            }
        }

        Operation::MergeNode {
            path: at, position, ..
        } => {
            let Some(depth) = at.len().checked_sub(1) else {
                return Some(p);
            };
            if equals(at, &p) || ends_before(at, &p) {
                p[depth] = p[depth].saturating_sub(1);
            } else if is_ancestor(at, &p) {
                p[depth] = p[depth].saturating_sub(1);
                p[at.len()] += position;
            }
        }

        Operation::SplitNode {
            path: at, position, ..
        } => {
            let Some(depth) = at.len().checked_sub(1) else {
                return Some(p);
            };
            if equals(at, &p) {
                match affinity {
                    Some(Affinity::Forward) => p[depth] += 1,
                    Some(Affinity::Backward) => {}
                    None => return None,
                }
            } else if ends_before(at, &p) {
                p[depth] += 1;
            } else if is_ancestor(at, &p) && path[at.len()] >= *position {
                p[depth] += 1;
                p[at.len()] -= position;
            }
        }

        Operation::MoveNode {
            path: from,
            new_path: to,
        } => {
            if equals(from, to) || from.is_empty() || to.is_empty() {
                return Some(p);
            }
            let from_depth = from.len() - 1;
            let to_depth = to.len() - 1;

            if is_ancestor(from, &p) || equals(from, &p) {
                let mut copy = to.clone();
                if ends_before(from, to) && from.len() < to.len() {
                    copy[from_depth] -= 1;
                }
                copy.extend_from_slice(&p[from.len()..]);
                return Some(copy);
            } else if is_sibling(from, to) && (is_ancestor(to, &p) || equals(to, &p)) {
                if ends_before(from, &p) {
                    p[from_depth] -= 1;
                } else {
                    p[from_depth] += 1;
                }
            } else if ends_before(to, &p) || equals(to, &p) || is_ancestor(to, &p) {
                if ends_before(from, &p) {
                    p[from_depth] -= 1;
                }
                p[to_depth] += 1;
            } else if ends_before(from, &p) {
                if equals(to, &p) {
                    p[to_depth] += 1;
                }
                p[from_depth] -= 1;
            }
        }

        Operation::InsertText { .. }
        | Operation::RemoveText { .. }
        | Operation::SetNode { .. }
        | Operation::SetSelection { .. } => {}
    }

    Some(p)
}
