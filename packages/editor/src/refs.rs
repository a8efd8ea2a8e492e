//! Tracked path, point and range references.
//!
//! A ref is registered against an editor and rebased synchronously on every
//! applied operation until its holder calls `unref`. A ref whose target is
//! removed stays registered with an unresolved (`None`) value.

use crate::editor::Editor;
use quire_model::path::{self, Affinity, Path};
use quire_model::{Operation, Point, Range, RangeAffinity};
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Debug, Clone)]
struct Tracked<T, A> {
    current: Option<T>,
    affinity: Option<A>,
}

#[derive(Debug, Default)]
pub(crate) struct RefRegistry {
    next_id: usize,
    paths: BTreeMap<usize, Tracked<Path, Affinity>>,
    points: BTreeMap<usize, Tracked<Point, Affinity>>,
    ranges: BTreeMap<usize, Tracked<Range, RangeAffinity>>,
}

impl RefRegistry {
    fn id(&mut self) -> usize {
        self.next_id += 1;
        self.next_id
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.paths.len() + self.points.len() + self.ranges.len()
    }

    pub fn transform(&mut self, op: &Operation) {
        for tracked in self.paths.values_mut() {
            if let Some(current) = &tracked.current {
                tracked.current = path::transform(current, op, tracked.affinity);
            }
        }
        for tracked in self.points.values_mut() {
            if let Some(current) = &tracked.current {
                tracked.current = current.transform(op, tracked.affinity);
            }
        }
        for tracked in self.ranges.values_mut() {
            if let Some(current) = &tracked.current {
                tracked.current = current.transform(op, tracked.affinity);
            }
        }
    }
}

/// Handle to a tracked path.
#[derive(Debug, PartialEq, Eq)]
pub struct PathRef {
    id: usize,
}

/// Handle to a tracked point.
#[derive(Debug, PartialEq, Eq)]
pub struct PointRef {
    id: usize,
}

/// Handle to a tracked range.
#[derive(Debug, PartialEq, Eq)]
pub struct RangeRef {
    id: usize,
}

impl PathRef {
    pub fn current(&self, editor: &Editor) -> Option<Path> {
        editor
            .refs()
            .paths
            .get(&self.id)
            .and_then(|tracked| tracked.current.clone())
    }

    /// Overwrite the tracked value.
    pub(crate) fn set(&self, editor: &mut Editor, path: Path) {
        if let Some(tracked) = editor.refs_mut().paths.get_mut(&self.id) {
            tracked.current = Some(path);
        }
    }

    /// Stop tracking and return the final value.
    pub fn unref(self, editor: &mut Editor) -> Option<Path> {
        let current = editor
            .refs_mut()
            .paths
            .remove(&self.id)
            .and_then(|tracked| tracked.current);
        if current.is_none() {
            debug!(id = self.id, "released unresolved path ref");
        }
        current
    }
}

impl PointRef {
    pub fn current(&self, editor: &Editor) -> Option<Point> {
        editor
            .refs()
            .points
            .get(&self.id)
            .and_then(|tracked| tracked.current.clone())
    }

    pub fn unref(self, editor: &mut Editor) -> Option<Point> {
        let current = editor
            .refs_mut()
            .points
            .remove(&self.id)
            .and_then(|tracked| tracked.current);
        if current.is_none() {
            debug!(id = self.id, "released unresolved point ref");
        }
        current
    }
}

impl RangeRef {
    pub fn current(&self, editor: &Editor) -> Option<Range> {
        editor
            .refs()
            .ranges
            .get(&self.id)
            .and_then(|tracked| tracked.current.clone())
    }

    pub fn unref(self, editor: &mut Editor) -> Option<Range> {
        let current = editor
            .refs_mut()
            .ranges
            .remove(&self.id)
            .and_then(|tracked| tracked.current);
        if current.is_none() {
            debug!(id = self.id, "released unresolved range ref");
        }
        current
    }
}

impl Editor {
    /// Track `path` across future operations.
    pub fn path_ref(&mut self, path: Path, affinity: Option<Affinity>) -> PathRef {
        let refs = self.refs_mut();
        let id = refs.id();
        refs.paths.insert(
            id,
            Tracked {
                current: Some(path),
                affinity,
            },
        );
        PathRef { id }
    }

    pub fn point_ref(&mut self, point: Point, affinity: Option<Affinity>) -> PointRef {
        let refs = self.refs_mut();
        let id = refs.id();
        refs.points.insert(
            id,
            Tracked {
                current: Some(point),
                affinity,
            },
        );
        PointRef { id }
    }

    pub fn range_ref(&mut self, range: Range, affinity: Option<RangeAffinity>) -> RangeRef {
        let refs = self.refs_mut();
        let id = refs.id();
        refs.ranges.insert(
            id,
            Tracked {
                current: Some(range),
                affinity,
            },
        );
        RangeRef { id }
    }
}
