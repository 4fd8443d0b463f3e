use ratatui::layout::Rect;
use serde::{Deserialize, Serialize};

pub type PaneId = uuid::Uuid;

/// Screen size in cells.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Size {
    pub rows: u16,
    pub cols: u16,
}

impl Size {
    pub fn new(rows: u16, cols: u16) -> Self {
        Self { rows, cols }
    }

    pub fn area(&self) -> Rect {
        Rect::new(0, 0, self.cols, self.rows)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SplitDirection {
    Horizontal,
    Vertical,
}

/// Binary split tree of panes. Leaves are pane ids; splits divide their area
/// between two children with a single divider cell in between.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum LayoutNode {
    Leaf(PaneId),
    Split {
        direction: SplitDirection,
        ratio: f64,
        first: Box<LayoutNode>,
        second: Box<LayoutNode>,
    },
}

impl LayoutNode {
    /// Resolve the tree into a flat list of pane rectangles within `area`.
    pub fn resolve(&self, area: Rect) -> Vec<LayoutEntry> {
        let mut result = Vec::new();
        self.resolve_inner(area, &mut result);
        result
    }

    fn resolve_inner(&self, area: Rect, result: &mut Vec<LayoutEntry>) {
        match self {
            LayoutNode::Leaf(id) => {
                result.push(LayoutEntry {
                    pane: *id,
                    rect: area,
                });
            }
            LayoutNode::Split {
                direction,
                ratio,
                first,
                second,
            } => {
                let (first_rect, second_rect) = Self::split_rects(*direction, *ratio, area);
                first.resolve_inner(first_rect, result);
                second.resolve_inner(second_rect, result);
            }
        }
    }

    /// Compute the child rects of a split, reserving one divider cell
    /// between them.
    fn split_rects(direction: SplitDirection, ratio: f64, area: Rect) -> (Rect, Rect) {
        match direction {
            SplitDirection::Horizontal => {
                let usable = area.width.saturating_sub(1);
                let first = ((usable as f64 * ratio).round() as u16).min(usable);
                (
                    Rect::new(area.x, area.y, first, area.height),
                    Rect::new(
                        area.x.saturating_add(first).saturating_add(1),
                        area.y,
                        usable - first,
                        area.height,
                    ),
                )
            }
            SplitDirection::Vertical => {
                let usable = area.height.saturating_sub(1);
                let first = ((usable as f64 * ratio).round() as u16).min(usable);
                (
                    Rect::new(area.x, area.y, area.width, first),
                    Rect::new(
                        area.x,
                        area.y.saturating_add(first).saturating_add(1),
                        area.width,
                        usable - first,
                    ),
                )
            }
        }
    }

    /// Split a target pane into two, placing the new pane in the second
    /// position.
    pub fn split_pane(&mut self, target: PaneId, direction: SplitDirection, new_id: PaneId) -> bool {
        match self {
            LayoutNode::Leaf(id) if *id == target => {
                *self = LayoutNode::Split {
                    direction,
                    ratio: 0.5,
                    first: Box::new(LayoutNode::Leaf(target)),
                    second: Box::new(LayoutNode::Leaf(new_id)),
                };
                true
            }
            LayoutNode::Split { first, second, .. } => {
                first.split_pane(target, direction, new_id)
                    || second.split_pane(target, direction, new_id)
            }
            _ => false,
        }
    }

    /// Close a pane, replacing its parent split with the sibling. Returns the
    /// sibling's first leaf (for focusing).
    pub fn close_pane(&mut self, target: PaneId) -> Option<PaneId> {
        match self {
            LayoutNode::Leaf(_) => None,
            LayoutNode::Split { first, second, .. } => {
                if matches!(first.as_ref(), LayoutNode::Leaf(id) if *id == target) {
                    let sibling = *second.clone();
                    let focus = sibling.first_leaf();
                    *self = sibling;
                    return Some(focus);
                }
                if matches!(second.as_ref(), LayoutNode::Leaf(id) if *id == target) {
                    let sibling = *first.clone();
                    let focus = sibling.first_leaf();
                    *self = sibling;
                    return Some(focus);
                }
                first
                    .close_pane(target)
                    .or_else(|| second.close_pane(target))
            }
        }
    }

    /// Swap one pane id for another in place, keeping the tree shape.
    pub fn replace_pane(&mut self, target: PaneId, new_id: PaneId) -> bool {
        match self {
            LayoutNode::Leaf(id) if *id == target => {
                *id = new_id;
                true
            }
            LayoutNode::Leaf(_) => false,
            LayoutNode::Split { first, second, .. } => {
                first.replace_pane(target, new_id) || second.replace_pane(target, new_id)
            }
        }
    }

    /// Adjust the ratio of the split directly containing the target pane.
    pub fn resize(&mut self, target: PaneId, delta: f64) -> bool {
        match self {
            LayoutNode::Leaf(_) => false,
            LayoutNode::Split {
                ratio,
                first,
                second,
                ..
            } => {
                let in_first = first.contains(target);
                let in_second = second.contains(target);
                if in_first || in_second {
                    let is_direct = matches!(first.as_ref(), LayoutNode::Leaf(id) if *id == target)
                        || matches!(second.as_ref(), LayoutNode::Leaf(id) if *id == target);
                    if is_direct {
                        let adjusted = if in_first { delta } else { -delta };
                        *ratio = (*ratio + adjusted).clamp(0.1, 0.9);
                        return true;
                    }
                    if in_first {
                        return first.resize(target, delta);
                    }
                    return second.resize(target, delta);
                }
                false
            }
        }
    }

    /// Find a split divider at the given cell within `area`. Returns the
    /// first child's first leaf (the id to pass to `resize`), the split
    /// direction, and the total extent along the split axis.
    pub fn find_divider(
        &self,
        row: u16,
        col: u16,
        area: Rect,
    ) -> Option<(PaneId, SplitDirection, u16)> {
        match self {
            LayoutNode::Leaf(_) => None,
            LayoutNode::Split {
                direction,
                ratio,
                first,
                second,
            } => {
                let (first_rect, second_rect) = Self::split_rects(*direction, *ratio, area);
                let hit = match direction {
                    SplitDirection::Horizontal => {
                        let divider_col = first_rect.x + first_rect.width;
                        row >= area.y && row < area.y + area.height && col == divider_col
                    }
                    SplitDirection::Vertical => {
                        let divider_row = first_rect.y + first_rect.height;
                        col >= area.x && col < area.x + area.width && row == divider_row
                    }
                };
                if hit {
                    let total = match direction {
                        SplitDirection::Horizontal => area.width,
                        SplitDirection::Vertical => area.height,
                    };
                    return Some((first.first_leaf(), *direction, total));
                }
                first
                    .find_divider(row, col, first_rect)
                    .or_else(|| second.find_divider(row, col, second_rect))
            }
        }
    }

    pub fn pane_ids(&self) -> Vec<PaneId> {
        let mut ids = Vec::new();
        self.collect_ids(&mut ids);
        ids
    }

    fn collect_ids(&self, ids: &mut Vec<PaneId>) {
        match self {
            LayoutNode::Leaf(id) => ids.push(*id),
            LayoutNode::Split { first, second, .. } => {
                first.collect_ids(ids);
                second.collect_ids(ids);
            }
        }
    }

    pub fn contains(&self, target: PaneId) -> bool {
        match self {
            LayoutNode::Leaf(id) => *id == target,
            LayoutNode::Split { first, second, .. } => {
                first.contains(target) || second.contains(target)
            }
        }
    }

    pub fn first_leaf(&self) -> PaneId {
        match self {
            LayoutNode::Leaf(id) => *id,
            LayoutNode::Split { first, .. } => first.first_leaf(),
        }
    }
}

/// A pane's resolved position: its bounding rectangle in screen cells,
/// 0-indexed at the tree root.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LayoutEntry {
    pub pane: PaneId,
    pub rect: Rect,
}

impl LayoutEntry {
    pub fn row(&self) -> u32 {
        self.rect.y as u32
    }

    pub fn col(&self) -> u32 {
        self.rect.x as u32
    }

    pub fn rows(&self) -> u32 {
        self.rect.height as u32
    }

    pub fn cols(&self) -> u32 {
        self.rect.width as u32
    }
}

/// The resolved layout of a tab: a flat snapshot of pane rectangles that
/// supports the hit tests navigation relies on.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LayoutTree {
    entries: Vec<LayoutEntry>,
}

impl LayoutTree {
    pub fn new(node: &LayoutNode, area: Rect) -> Self {
        Self {
            entries: node.resolve(area),
        }
    }

    /// A tree containing a single pane covering the whole area (zoom).
    pub fn single(pane: PaneId, area: Rect) -> Self {
        Self {
            entries: vec![LayoutEntry { pane, rect: area }],
        }
    }

    pub fn entries(&self) -> &[LayoutEntry] {
        &self.entries
    }

    pub fn find_pane(&self, pane: PaneId) -> Option<LayoutEntry> {
        self.entries.iter().copied().find(|e| e.pane == pane)
    }

    /// Point hit test in screen cells.
    pub fn hit_test(&self, row: u16, col: u16) -> Option<LayoutEntry> {
        self.entries.iter().copied().find(|e| {
            row >= e.rect.y
                && row < e.rect.y + e.rect.height
                && col >= e.rect.x
                && col < e.rect.x + e.rect.width
        })
    }

    /// Panes crossing column `col` within rows `[row_start, row_end)`.
    pub fn hit_test_vertical_line(
        &self,
        col: u32,
        row_start: u32,
        row_end: u32,
    ) -> Vec<LayoutEntry> {
        self.entries
            .iter()
            .copied()
            .filter(|e| {
                col >= e.col()
                    && col < e.col() + e.cols()
                    && e.row().max(row_start) < (e.row() + e.rows()).min(row_end)
            })
            .collect()
    }

    /// Panes crossing row `row` within columns `[col_start, col_end)`.
    pub fn hit_test_horizontal_line(
        &self,
        row: u32,
        col_start: u32,
        col_end: u32,
    ) -> Vec<LayoutEntry> {
        self.entries
            .iter()
            .copied()
            .filter(|e| {
                row >= e.row()
                    && row < e.row() + e.rows()
                    && e.col().max(col_start) < (e.col() + e.cols()).min(col_end)
            })
            .collect()
    }
}
