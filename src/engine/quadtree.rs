use eframe::egui::{Rect, pos2};

use super::culling::rects_overlap;

/// Finite rectangle with positive area. Anything else matches nothing.
pub fn is_queryable(rect: Rect) -> bool {
    rect.is_finite() && rect.width() > 0.0 && rect.height() > 0.0
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QuadtreeLimits {
    pub max_objects: usize,
    pub max_levels: usize,
}

#[derive(Clone, Copy, Debug)]
struct IndexEntry<T> {
    rect: Rect,
    payload: T,
}

/// One partition of the tree, for debug overlays.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct QuadtreeCell {
    pub rect: Rect,
    pub depth: usize,
    pub is_leaf: bool,
}

#[derive(Debug)]
struct QuadNode<T> {
    bounds: Rect,
    level: usize,
    entries: Vec<IndexEntry<T>>,
    children: Option<Box<[QuadNode<T>; 4]>>,
}

fn child_bounds(bounds: Rect, quadrant: usize) -> Rect {
    let mid = bounds.center();
    match quadrant {
        0 => Rect::from_min_max(bounds.min, mid),
        1 => Rect::from_min_max(pos2(mid.x, bounds.min.y), pos2(bounds.max.x, mid.y)),
        2 => Rect::from_min_max(pos2(bounds.min.x, mid.y), pos2(mid.x, bounds.max.y)),
        _ => Rect::from_min_max(mid, bounds.max),
    }
}

/// Quadrant that fully contains `rect`, or `None` when it straddles a
/// midline or pokes out of `bounds`.
fn quadrant_for(bounds: Rect, rect: Rect) -> Option<usize> {
    let mid = bounds.center();
    let left = rect.min.x >= bounds.min.x && rect.max.x < mid.x;
    let right = rect.min.x > mid.x && rect.max.x <= bounds.max.x;
    let top = rect.min.y >= bounds.min.y && rect.max.y < mid.y;
    let bottom = rect.min.y > mid.y && rect.max.y <= bounds.max.y;

    match (left, right, top, bottom) {
        (true, _, true, _) => Some(0),
        (_, true, true, _) => Some(1),
        (true, _, _, true) => Some(2),
        (_, true, _, true) => Some(3),
        _ => None,
    }
}

impl<T: Copy> QuadNode<T> {
    fn new(bounds: Rect, level: usize) -> Self {
        Self {
            bounds,
            level,
            entries: Vec::new(),
            children: None,
        }
    }

    fn insert(&mut self, entry: IndexEntry<T>, limits: QuadtreeLimits) {
        if let Some(quadrant) = quadrant_for(self.bounds, entry.rect)
            && let Some(children) = self.children.as_mut()
        {
            children[quadrant].insert(entry, limits);
            return;
        }

        self.entries.push(entry);
        if self.children.is_none()
            && self.entries.len() > limits.max_objects
            && self.level < limits.max_levels
        {
            self.split(limits);
        }
    }

    fn split(&mut self, limits: QuadtreeLimits) {
        let bounds = self.bounds;
        let level = self.level + 1;
        let mut children = Box::new(std::array::from_fn(|quadrant| {
            Self::new(child_bounds(bounds, quadrant), level)
        }));

        let entries = std::mem::take(&mut self.entries);
        for entry in entries {
            match quadrant_for(bounds, entry.rect) {
                Some(quadrant) => children[quadrant].insert(entry, limits),
                None => self.entries.push(entry),
            }
        }
        self.children = Some(children);
    }

    fn collect(&self, query: Rect, out: &mut Vec<T>) {
        for entry in &self.entries {
            if rects_overlap(entry.rect, query) {
                out.push(entry.payload);
            }
        }

        if let Some(children) = self.children.as_ref() {
            for child in children.iter() {
                if rects_overlap(child.bounds, query) {
                    child.collect(query, out);
                }
            }
        }
    }

    fn collect_cells(&self, cells: &mut Vec<QuadtreeCell>) {
        cells.push(QuadtreeCell {
            rect: self.bounds,
            depth: self.level,
            is_leaf: self.children.is_none(),
        });

        if let Some(children) = self.children.as_ref() {
            for child in children.iter() {
                child.collect_cells(cells);
            }
        }
    }
}

/// Region quadtree over axis-aligned rectangles. Entries that straddle a
/// partition boundary stay at the deepest node that fully contains them.
#[derive(Debug)]
pub struct Quadtree<T> {
    root: QuadNode<T>,
    limits: QuadtreeLimits,
    len: usize,
}

impl<T: Copy> Quadtree<T> {
    pub fn new(bounds: Rect, limits: QuadtreeLimits) -> Self {
        Self {
            root: QuadNode::new(bounds, 0),
            limits,
            len: 0,
        }
    }

    pub fn bounds(&self) -> Rect {
        self.root.bounds
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn clear(&mut self) {
        self.root = QuadNode::new(self.root.bounds, 0);
        self.len = 0;
    }

    pub fn insert(&mut self, rect: Rect, payload: T) {
        self.root.insert(IndexEntry { rect, payload }, self.limits);
        self.len += 1;
    }

    /// Payloads whose rectangles overlap `query`. Degenerate queries (empty,
    /// zero-area or non-finite) match nothing.
    pub fn query(&self, query: Rect) -> Vec<T> {
        let mut out = Vec::new();
        if !is_queryable(query) {
            return out;
        }

        self.root.collect(query, &mut out);
        out
    }

    pub fn cells(&self) -> Vec<QuadtreeCell> {
        let mut cells = Vec::new();
        self.root.collect_cells(&mut cells);
        cells
    }
}
