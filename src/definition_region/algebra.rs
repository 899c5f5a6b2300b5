//! Slab decomposition shared by `simplify`, the set operations and morphology.
//!
//! Inputs are cut by every y and z boundary plane they carry. Each (y, z) slab
//! then holds a list of x intervals, and the boolean operation runs on those
//! 1D lists. The surviving intervals are glued back together along z and then
//! along y. Because extra cuts never change a slab's contents, the output only
//! depends on which cells are members.

use super::DefinitionRegion;
use crate::bounding_box::BoundingBox;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

type Pos = (i32, i32, i32);
/// Half-open interval over i64 so `max + 1` never overflows.
type Interval = (i64, i64);
type Rect = (Interval, Interval);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SetOp {
    Union,
    Intersect,
    Subtract,
}

impl SetOp {
    #[inline]
    fn keep(self, in_a: bool, in_b: bool) -> bool {
        match self {
            SetOp::Union => in_a || in_b,
            SetOp::Intersect => in_a && in_b,
            SetOp::Subtract => in_a && !in_b,
        }
    }
}

/// Canonical decomposition: disjoint non-unit boxes plus loose cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Canonical {
    pub boxes: Vec<BoundingBox>,
    pub points: BTreeSet<Pos>,
}

impl Canonical {
    pub fn into_boxes(self) -> Vec<BoundingBox> {
        let mut boxes = self.boxes;
        boxes.extend(self.points.into_iter().map(BoundingBox::point));
        boxes
    }
}

fn cut_index(cuts: &[i64], value: i64) -> usize {
    cuts.binary_search(&value).unwrap_or_else(|i| i)
}

fn sorted_cuts<'a>(boxes: impl Iterator<Item = &'a BoundingBox>, axis: fn(&BoundingBox) -> (i32, i32)) -> Vec<i64> {
    let mut cuts: Vec<i64> = boxes
        .flat_map(|b| {
            let (lo, hi) = axis(b);
            [lo as i64, hi as i64 + 1]
        })
        .collect();
    cuts.sort_unstable();
    cuts.dedup();
    cuts
}

/// Sorts and merges overlapping or touching intervals.
fn normalise(mut intervals: Vec<Interval>) -> Vec<Interval> {
    intervals.sort_unstable();
    let mut out: Vec<Interval> = Vec::with_capacity(intervals.len());
    for (start, end) in intervals {
        match out.last_mut() {
            Some(last) if start <= last.1 => last.1 = last.1.max(end),
            _ => out.push((start, end)),
        }
    }
    out
}

#[inline]
fn covers(intervals: &[Interval], x: i64) -> bool {
    let i = intervals.partition_point(|iv| iv.1 <= x);
    i < intervals.len() && intervals[i].0 <= x
}

fn apply_1d(op: SetOp, a: &[Interval], b: &[Interval]) -> Vec<Interval> {
    let mut cuts: Vec<i64> = a.iter().chain(b).flat_map(|&(s, e)| [s, e]).collect();
    cuts.sort_unstable();
    cuts.dedup();

    let mut out: Vec<Interval> = Vec::new();
    for w in cuts.windows(2) {
        let (start, end) = (w[0], w[1]);
        if !op.keep(covers(a, start), covers(b, start)) {
            continue;
        }
        match out.last_mut() {
            Some(last) if last.1 == start => last.1 = end,
            _ => out.push((start, end)),
        }
    }
    out
}

fn close_runs<K: Copy + Eq + std::hash::Hash>(open: &mut HashMap<K, i64>, end: i64, out: &mut Vec<(K, Interval)>) {
    for (key, start) in open.drain() {
        out.push((key, (start, end)));
    }
}

/// Applies `op` to the memberships of `a` and `b`. Either side may hold
/// overlapping boxes.
pub(crate) fn combine(a: &[BoundingBox], b: &[BoundingBox], op: SetOp) -> Canonical {
    let ys = sorted_cuts(a.iter().chain(b), |bx| (bx.min.1, bx.max.1));
    let zs = sorted_cuts(a.iter().chain(b), |bx| (bx.min.2, bx.max.2));

    let mut slabs: BTreeMap<(usize, usize), [Vec<Interval>; 2]> = BTreeMap::new();
    for (operand, boxes) in [(0usize, a), (1usize, b)] {
        for bx in boxes.iter().filter(|bx| bx.is_valid()) {
            let y_range = cut_index(&ys, bx.min.1 as i64)..cut_index(&ys, bx.max.1 as i64 + 1);
            let z_range = cut_index(&zs, bx.min.2 as i64)..cut_index(&zs, bx.max.2 as i64 + 1);
            let x = (bx.min.0 as i64, bx.max.0 as i64 + 1);
            for iy in y_range {
                for iz in z_range.clone() {
                    slabs.entry((iy, iz)).or_default()[operand].push(x);
                }
            }
        }
    }

    // Boolean op per slab, then glue identical x intervals along z.
    let mut rects_by_y: BTreeMap<usize, Vec<Rect>> = BTreeMap::new();
    let mut open_x: HashMap<Interval, i64> = HashMap::new();
    let mut cursor: Option<(usize, usize)> = None;
    for ((iy, iz), [in_a, in_b]) in slabs {
        let kept = apply_1d(op, &normalise(in_a), &normalise(in_b));
        if kept.is_empty() {
            continue;
        }
        if let Some((py, pz)) = cursor {
            if py != iy || pz + 1 != iz {
                close_runs(&mut open_x, zs[pz + 1], rects_by_y.entry(py).or_default());
            }
        }
        let present: HashSet<Interval> = kept.iter().copied().collect();
        let ended: Vec<Interval> = open_x
            .keys()
            .filter(|k| !present.contains(*k))
            .copied()
            .collect();
        for x in ended {
            if let Some(start) = open_x.remove(&x) {
                rects_by_y.entry(iy).or_default().push((x, (start, zs[iz])));
            }
        }
        for x in kept {
            open_x.entry(x).or_insert(zs[iz]);
        }
        cursor = Some((iy, iz));
    }
    if let Some((py, pz)) = cursor {
        close_runs(&mut open_x, zs[pz + 1], rects_by_y.entry(py).or_default());
    }

    // Glue identical rectangles along y.
    let mut out = Canonical::default();
    let mut finished: Vec<(Rect, Interval)> = Vec::new();
    let mut open_rects: HashMap<Rect, i64> = HashMap::new();
    let mut prev_y: Option<usize> = None;
    for (iy, mut rects) in rects_by_y {
        rects.sort_unstable();
        if let Some(py) = prev_y {
            if py + 1 != iy {
                close_runs(&mut open_rects, ys[py + 1], &mut finished);
            }
        }
        let present: HashSet<Rect> = rects.iter().copied().collect();
        let ended: Vec<Rect> = open_rects
            .keys()
            .filter(|k| !present.contains(*k))
            .copied()
            .collect();
        for rect in ended {
            if let Some(start) = open_rects.remove(&rect) {
                finished.push((rect, (start, ys[iy])));
            }
        }
        for rect in rects {
            open_rects.entry(rect).or_insert(ys[iy]);
        }
        prev_y = Some(iy);
    }
    if let Some(py) = prev_y {
        close_runs(&mut open_rects, ys[py + 1], &mut finished);
    }

    for (((x0, x1), (z0, z1)), (y0, y1)) in finished {
        let bx = BoundingBox::new(
            (x0 as i32, y0 as i32, z0 as i32),
            ((x1 - 1) as i32, (y1 - 1) as i32, (z1 - 1) as i32),
        );
        if bx.is_unit() {
            out.points.insert(bx.min);
        } else {
            out.boxes.push(bx);
        }
    }
    out.boxes.sort_unstable_by_key(|b| {
        (b.min.2, b.min.1, b.min.0, b.max.2, b.max.1, b.max.0)
    });
    out
}

/// `a` minus `b` as at most six disjoint boxes.
pub(crate) fn box_difference(a: &BoundingBox, b: &BoundingBox) -> Vec<BoundingBox> {
    let Some(cut) = a.intersection(b) else {
        return vec![*a];
    };
    let mut pieces = Vec::with_capacity(6);
    if a.min.0 < cut.min.0 {
        pieces.push(BoundingBox::new(a.min, (cut.min.0 - 1, a.max.1, a.max.2)));
    }
    if cut.max.0 < a.max.0 {
        pieces.push(BoundingBox::new((cut.max.0 + 1, a.min.1, a.min.2), a.max));
    }
    if a.min.1 < cut.min.1 {
        pieces.push(BoundingBox::new(
            (cut.min.0, a.min.1, a.min.2),
            (cut.max.0, cut.min.1 - 1, a.max.2),
        ));
    }
    if cut.max.1 < a.max.1 {
        pieces.push(BoundingBox::new(
            (cut.min.0, cut.max.1 + 1, a.min.2),
            (cut.max.0, a.max.1, a.max.2),
        ));
    }
    if a.min.2 < cut.min.2 {
        pieces.push(BoundingBox::new(
            (cut.min.0, cut.min.1, a.min.2),
            (cut.max.0, cut.max.1, cut.min.2 - 1),
        ));
    }
    if cut.max.2 < a.max.2 {
        pieces.push(BoundingBox::new(
            (cut.min.0, cut.min.1, cut.max.2 + 1),
            (cut.max.0, cut.max.1, a.max.2),
        ));
    }
    pieces
}

fn inflate(b: &BoundingBox, (dx, dy, dz): Pos) -> BoundingBox {
    BoundingBox::new(
        (
            b.min.0.saturating_sub(dx),
            b.min.1.saturating_sub(dy),
            b.min.2.saturating_sub(dz),
        ),
        (
            b.max.0.saturating_add(dx),
            b.max.1.saturating_add(dy),
            b.max.2.saturating_add(dz),
        ),
    )
}

fn dilate(boxes: &[BoundingBox], amount: Pos) -> Vec<BoundingBox> {
    boxes.iter().map(|b| inflate(b, amount)).collect()
}

/// Keeps the cells whose whole `amount` neighbourhood is a member:
/// `R \ dilate(frame \ R)`, where the frame is the bounds grown by `amount`.
fn erode(boxes: &[BoundingBox], amount: Pos) -> Canonical {
    let Some(bounds) = boxes.iter().copied().reduce(|acc, b| acc.union(&b)) else {
        return Canonical::default();
    };
    let frame = inflate(&bounds, amount);
    let outside = combine(&[frame], boxes, SetOp::Subtract).into_boxes();
    combine(boxes, &dilate(&outside, amount), SetOp::Subtract)
}

impl DefinitionRegion {
    /// Every member as boxes, loose cells included as unit boxes.
    pub(crate) fn as_boxes(&self) -> Vec<BoundingBox> {
        let mut boxes = self.boxes.clone();
        boxes.extend(self.points.iter().copied().map(BoundingBox::point));
        boxes
    }

    pub(crate) fn canonical(&self) -> Canonical {
        combine(&self.as_boxes(), &[], SetOp::Union)
    }

    fn set_canonical(&mut self, canonical: Canonical) -> &mut Self {
        self.boxes = canonical.boxes;
        self.points = canonical.points;
        self
    }

    fn with_canonical(&self, canonical: Canonical) -> DefinitionRegion {
        DefinitionRegion {
            boxes: canonical.boxes,
            points: canonical.points,
            metadata: self.metadata.clone(),
        }
    }

    /// Rewrites the region into its canonical form. Applying it twice changes nothing.
    pub fn simplify(&mut self) -> &mut Self {
        let canonical = self.canonical();
        self.set_canonical(canonical)
    }

    /// True when both regions cover exactly the same cells.
    pub fn same_members(&self, other: &DefinitionRegion) -> bool {
        self.volume() == other.volume() && self.canonical() == other.canonical()
    }

    /// Cells in either region. Keys from `other` win on metadata conflicts.
    pub fn union(&self, other: &DefinitionRegion) -> DefinitionRegion {
        let mut result = self.with_canonical(combine(&self.as_boxes(), &other.as_boxes(), SetOp::Union));
        result
            .metadata
            .extend(other.metadata.iter().map(|(k, v)| (k.clone(), v.clone())));
        result
    }

    pub fn intersect(&self, other: &DefinitionRegion) -> DefinitionRegion {
        self.with_canonical(combine(&self.as_boxes(), &other.as_boxes(), SetOp::Intersect))
    }

    pub fn subtract(&self, other: &DefinitionRegion) -> DefinitionRegion {
        self.with_canonical(combine(&self.as_boxes(), &other.as_boxes(), SetOp::Subtract))
    }

    pub fn union_into(&mut self, other: &DefinitionRegion) -> &mut Self {
        let canonical = combine(&self.as_boxes(), &other.as_boxes(), SetOp::Union);
        self.metadata
            .extend(other.metadata.iter().map(|(k, v)| (k.clone(), v.clone())));
        self.set_canonical(canonical)
    }

    pub fn intersect_with(&mut self, other: &DefinitionRegion) -> &mut Self {
        let canonical = combine(&self.as_boxes(), &other.as_boxes(), SetOp::Intersect);
        self.set_canonical(canonical)
    }

    pub fn subtract_from(&mut self, other: &DefinitionRegion) -> &mut Self {
        let canonical = combine(&self.as_boxes(), &other.as_boxes(), SetOp::Subtract);
        self.set_canonical(canonical)
    }

    /// Morphological expansion per axis. Positive amounts dilate, negative amounts erode.
    pub fn expand(&mut self, x: i32, y: i32, z: i32) -> &mut Self {
        let grow = (x.max(0), y.max(0), z.max(0));
        let shrink = (
            x.min(0).saturating_neg(),
            y.min(0).saturating_neg(),
            z.min(0).saturating_neg(),
        );

        let mut boxes = self.as_boxes();
        if grow != (0, 0, 0) {
            boxes = dilate(&boxes, grow);
        }
        let canonical = if shrink != (0, 0, 0) {
            erode(&boxes, shrink)
        } else {
            combine(&boxes, &[], SetOp::Union)
        };
        self.set_canonical(canonical)
    }

    /// Erodes every axis by `amount`.
    pub fn contract(&mut self, amount: i32) -> &mut Self {
        let amount = amount.saturating_neg();
        self.expand(amount, amount, amount)
    }

    pub fn expanded(&self, x: i32, y: i32, z: i32) -> DefinitionRegion {
        let mut result = self.clone();
        result.expand(x, y, z);
        result
    }

    pub fn contracted(&self, amount: i32) -> DefinitionRegion {
        let mut result = self.clone();
        result.contract(amount);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(boxes: &[BoundingBox]) -> BTreeSet<Pos> {
        boxes.iter().flat_map(|b| b.iter_points()).collect()
    }

    #[test]
    fn test_apply_1d() {
        let a = vec![(0, 5)];
        let b = vec![(2, 3), (4, 8)];
        assert_eq!(apply_1d(SetOp::Union, &a, &b), vec![(0, 8)]);
        assert_eq!(apply_1d(SetOp::Intersect, &a, &b), vec![(2, 3), (4, 5)]);
        assert_eq!(apply_1d(SetOp::Subtract, &a, &b), vec![(0, 2), (3, 4)]);
    }

    #[test]
    fn test_normalise_merges_touching() {
        assert_eq!(normalise(vec![(3, 5), (0, 3), (7, 9)]), vec![(0, 5), (7, 9)]);
    }

    #[test]
    fn test_combine_merges_split_boxes() {
        let split = [
            BoundingBox::new((0, 0, 0), (3, 1, 3)),
            BoundingBox::new((0, 2, 0), (3, 3, 3)),
        ];
        let result = combine(&split, &[], SetOp::Union);
        assert_eq!(result.boxes, vec![BoundingBox::new((0, 0, 0), (3, 3, 3))]);
        assert!(result.points.is_empty());
    }

    #[test]
    fn test_combine_preserves_membership() {
        let input = [
            BoundingBox::new((0, 0, 0), (4, 2, 1)),
            BoundingBox::new((2, 1, 0), (6, 5, 3)),
            BoundingBox::point((-3, 7, 2)),
        ];
        let result = combine(&input, &[], SetOp::Union);
        let expected = cells(&input);
        let got = cells(&result.clone().into_boxes());
        assert_eq!(got, expected);

        let total: u64 = result.boxes.iter().map(|b| b.volume()).sum::<u64>() + result.points.len() as u64;
        assert_eq!(total, expected.len() as u64);
    }

    #[test]
    fn test_box_difference() {
        let a = BoundingBox::new((0, 0, 0), (4, 4, 4));
        let b = BoundingBox::new((1, 1, 1), (2, 2, 2));
        let pieces = box_difference(&a, &b);
        let total: u64 = pieces.iter().map(|p| p.volume()).sum();
        assert_eq!(total, 125 - 8);
        for (i, p) in pieces.iter().enumerate() {
            assert!(!p.intersects(&b));
            for q in &pieces[i + 1..] {
                assert!(!p.intersects(q));
            }
        }
        assert_eq!(box_difference(&a, &BoundingBox::point((9, 9, 9))), vec![a]);
    }

    #[test]
    fn test_erode_thin_box_vanishes() {
        let boxes = [BoundingBox::new((0, 0, 0), (10, 1, 10))];
        assert_eq!(erode(&boxes, (1, 1, 1)), Canonical::default());
        let kept = erode(&boxes, (1, 0, 1));
        assert_eq!(kept.boxes, vec![BoundingBox::new((1, 0, 1), (9, 1, 9))]);
    }
}
