use crate::operation::Operation;
use crate::path::{self, Affinity};
use crate::point::Point;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// An anchor/focus pair. The anchor is where a selection started, the
/// focus where it ends; either may come first in document order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range {
    pub anchor: Point,
    pub focus: Point,
}

/// How a range reacts to edits that land exactly on its edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RangeAffinity {
    Forward,
    Backward,
    /// Shrink toward the interior.
    Inward,
    /// Grow to include the edit.
    Outward,
}

impl Range {
    pub fn new(anchor: Point, focus: Point) -> Self {
        Self { anchor, focus }
    }

    pub fn collapsed(point: Point) -> Self {
        Self {
            anchor: point.clone(),
            focus: point,
        }
    }

    /// `(start, end)` in document order.
    pub fn edges(&self) -> (Point, Point) {
        if self.is_backward() {
            (self.focus.clone(), self.anchor.clone())
        } else {
            (self.anchor.clone(), self.focus.clone())
        }
    }

    pub fn start(&self) -> Point {
        self.edges().0
    }

    pub fn end(&self) -> Point {
        self.edges().1
    }

    pub fn is_backward(&self) -> bool {
        self.anchor.is_after(&self.focus)
    }

    pub fn is_forward(&self) -> bool {
        !self.is_backward()
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }

    pub fn is_expanded(&self) -> bool {
        !self.is_collapsed()
    }

    /// Anchor then focus.
    pub fn points(&self) -> [&Point; 2] {
        [&self.anchor, &self.focus]
    }

    /// Whether the path falls between the range's edge paths.
    pub fn includes_path(&self, target: &[usize]) -> bool {
        let (start, end) = self.edges();
        path::compare(target, &start.path) != Ordering::Less
            && path::compare(target, &end.path) != Ordering::Greater
    }

    pub fn includes_point(&self, target: &Point) -> bool {
        let (start, end) = self.edges();
        target.compare(&start) != Ordering::Less && target.compare(&end) != Ordering::Greater
    }

    /// Whether the ranges overlap at all.
    pub fn includes_range(&self, target: &Range) -> bool {
        if self.includes_point(&target.anchor) || self.includes_point(&target.focus) {
            return true;
        }
        let (rs, re) = self.edges();
        let (ts, te) = target.edges();
        rs.is_before(&ts) && re.is_after(&te)
    }

    /// The overlapping part of two ranges, forward-facing.
    pub fn intersection(&self, other: &Range) -> Option<Range> {
        let (s1, e1) = self.edges();
        let (s2, e2) = other.edges();
        let start = if s1.is_before(&s2) { s2 } else { s1 };
        let end = if e1.is_before(&e2) { e1 } else { e2 };
        if end.is_before(&start) {
            None
        } else {
            Some(Range::new(start, end))
        }
    }

    /// Whether `target` lies wholly inside this range.
    pub fn surrounds(&self, target: &Range) -> bool {
        match self.intersection(target) {
            Some(overlap) => {
                let (ts, te) = target.edges();
                overlap.anchor == ts && overlap.focus == te
            }
            None => false,
        }
    }

    /// Rebase across `op`. `None` means one of the edges no longer resolves.
    pub fn transform(&self, op: &Operation, affinity: Option<RangeAffinity>) -> Option<Range> {
        let (anchor_affinity, focus_affinity) = match affinity {
            Some(RangeAffinity::Inward) => {
                let collapsed = self.is_collapsed();
                if self.is_forward() {
                    let anchor = Some(Affinity::Forward);
                    (anchor, if collapsed { anchor } else { Some(Affinity::Backward) })
                } else {
                    let anchor = Some(Affinity::Backward);
                    (anchor, if collapsed { anchor } else { Some(Affinity::Forward) })
                }
            }
            Some(RangeAffinity::Outward) => {
                if self.is_forward() {
                    (Some(Affinity::Backward), Some(Affinity::Forward))
                } else {
                    (Some(Affinity::Forward), Some(Affinity::Backward))
                }
            }
            Some(RangeAffinity::Forward) => (Some(Affinity::Forward), Some(Affinity::Forward)),
            Some(RangeAffinity::Backward) => (Some(Affinity::Backward), Some(Affinity::Backward)),
            None => (None, None),
        };

        let anchor = self.anchor.transform(op, anchor_affinity)?;
        let focus = self.focus.transform(op, focus_affinity)?;
        Some(Range { anchor, focus })
    }
}

impl From<Point> for Range {
    fn from(point: Point) -> Self {
        Range::collapsed(point)
    }
}
