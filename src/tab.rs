use std::collections::{HashMap, HashSet, VecDeque};

use crate::layout::{LayoutEntry, LayoutNode, LayoutTree, PaneId, Size, SplitDirection};
use crate::pane::Pane;
use crate::protocol::{NavigateDirection, Osc8671, RequestType, WrapMode};

/// Whether `navigate` may delegate the move to the active pane's
/// application before falling back to the layout tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SeamlessMode {
    Disabled,
    Enabled,
}

/// A set of panes sharing the screen, with at most one active. Keeps the
/// split tree, the resolved layout, and the panes ordered by recency of
/// activation (the tie-break for navigation).
pub struct Tab {
    name: String,
    size: Size,
    layout: Option<LayoutNode>,
    tree: Option<LayoutTree>,
    panes: HashMap<PaneId, Pane>,
    recency: VecDeque<PaneId>,
    active: Option<PaneId>,
    zoomed: Option<PaneId>,
    is_active: bool,
}

impl Tab {
    pub fn new(name: impl Into<String>, size: Size) -> Self {
        Self {
            name: name.into(),
            size,
            layout: None,
            tree: None,
            panes: HashMap::new(),
            recency: VecDeque::new(),
            active: None,
            zoomed: None,
            is_active: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn is_empty(&self) -> bool {
        self.panes.is_empty()
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn tree(&self) -> Option<&LayoutTree> {
        self.tree.as_ref()
    }

    pub fn layout_node(&self) -> Option<&LayoutNode> {
        self.layout.as_ref()
    }

    pub fn active(&self) -> Option<PaneId> {
        self.active
    }

    pub fn zoomed(&self) -> Option<PaneId> {
        self.zoomed
    }

    pub fn pane(&self, id: PaneId) -> Option<&Pane> {
        self.panes.get(&id)
    }

    pub fn pane_mut(&mut self, id: PaneId) -> Option<&mut Pane> {
        self.panes.get_mut(&id)
    }

    pub fn active_pane_mut(&mut self) -> Option<&mut Pane> {
        let active = self.active?;
        self.panes.get_mut(&active)
    }

    pub fn panes_by_recency(&self) -> impl Iterator<Item = PaneId> + '_ {
        self.recency.iter().copied()
    }

    /// Recompute the resolved layout for a new screen size.
    pub fn layout(&mut self, size: Size) {
        self.size = size;
        self.relayout();
    }

    fn relayout(&mut self) {
        let area = self.size.area();
        self.tree = match (self.zoomed, &self.layout) {
            // A zoomed pane circumvents ordinary layout.
            (Some(zoomed), _) => Some(LayoutTree::single(zoomed, area)),
            (None, Some(node)) => Some(LayoutTree::new(node, area)),
            (None, None) => None,
        };
    }

    /// Insert a pane by splitting the active pane (or filling an empty tab)
    /// and make it active.
    pub fn add_pane(&mut self, pane: Pane, direction: SplitDirection) -> bool {
        let id = pane.id;
        match &mut self.layout {
            None => self.layout = Some(LayoutNode::Leaf(id)),
            Some(node) => {
                let target = self.active.unwrap_or_else(|| node.first_leaf());
                if !node.split_pane(target, direction, id) {
                    return false;
                }
            }
        }
        self.panes.insert(id, pane);
        self.recency.push_back(id);
        self.relayout();
        self.set_active(Some(id));
        true
    }

    /// Remove a pane, collapsing its split. The most recently active
    /// remaining pane takes focus.
    pub fn remove_pane(&mut self, id: PaneId) -> Option<Pane> {
        let pane = self.panes.remove(&id)?;
        if self.zoomed == Some(id) {
            self.zoomed = None;
        }
        self.recency.retain(|other| *other != id);
        match &mut self.layout {
            Some(LayoutNode::Leaf(leaf)) if *leaf == id => self.layout = None,
            Some(node) => {
                node.close_pane(id);
            }
            None => {}
        }
        self.relayout();
        if self.active == Some(id) {
            let next = self.recency.front().copied();
            self.set_active(next);
        }
        Some(pane)
    }

    /// Swap a pane for a replacement in the same layout position, keeping
    /// its recency slot, zoom, and focus.
    pub fn replace_pane(&mut self, target: PaneId, pane: Pane) -> bool {
        let new_id = pane.id;
        if !self.panes.contains_key(&target) {
            return false;
        }
        match &mut self.layout {
            Some(node) => {
                if !node.replace_pane(target, new_id) {
                    return false;
                }
            }
            None => return false,
        }
        self.panes.remove(&target);
        self.panes.insert(new_id, pane);
        for slot in &mut self.recency {
            if *slot == target {
                *slot = new_id;
            }
        }
        if self.zoomed == Some(target) {
            self.zoomed = Some(new_id);
        }
        if self.active == Some(target) {
            self.active = Some(new_id);
            if self.is_active {
                if let Some(pane) = self.panes.get_mut(&new_id) {
                    pane.focus_event(true);
                }
            }
        }
        self.relayout();
        true
    }

    /// Returns true if the active pane changed.
    pub fn set_active(&mut self, pane: Option<PaneId>) -> bool {
        if self.active == pane {
            return false;
        }

        // Zoom follows focus; focusing another pane drops it.
        if self.zoomed.is_some() && self.zoomed != pane {
            self.zoomed = None;
            self.relayout();
        }

        if self.is_active {
            if let Some(old) = self.active.and_then(|id| self.panes.get_mut(&id)) {
                old.focus_event(false);
            }
        }
        self.active = pane;
        if let Some(id) = pane {
            self.recency.retain(|other| *other != id);
            self.recency.push_front(id);
        }
        if self.is_active {
            if let Some(new) = self.active.and_then(|id| self.panes.get_mut(&id)) {
                new.focus_event(true);
            }
        }
        true
    }

    pub fn set_zoomed(&mut self, pane: Option<PaneId>) -> bool {
        if self.zoomed == pane {
            return false;
        }
        match pane {
            None => {
                self.zoomed = None;
                self.relayout();
            }
            Some(id) => {
                if !self.panes.contains_key(&id) {
                    return false;
                }
                self.zoomed = Some(id);
                self.set_active(Some(id));
                self.relayout();
            }
        }
        true
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Tab gained or lost screen presence; the active pane's focus state
    /// follows.
    pub fn set_is_active(&mut self, active: bool) -> bool {
        if self.is_active == active {
            return false;
        }
        if self.is_active {
            if let Some(pane) = self.active.and_then(|id| self.panes.get_mut(&id)) {
                pane.focus_event(false);
            }
        }
        self.is_active = active;
        if self.is_active {
            if let Some(pane) = self.active.and_then(|id| self.panes.get_mut(&id)) {
                pane.focus_event(true);
            }
        }
        true
    }

    /// Drag a split divider from one cell to another. `from` must sit on a
    /// divider; the drag distance along the split axis is converted into a
    /// ratio adjustment. Returns true when the layout changed.
    pub fn drag_divider(&mut self, from: (u16, u16), to: (u16, u16)) -> bool {
        if self.zoomed.is_some() {
            return false;
        }
        let area = self.size.area();
        let node = match &mut self.layout {
            Some(node) => node,
            None => return false,
        };
        let (target, direction, total) = match node.find_divider(from.0, from.1, area) {
            Some(hit) => hit,
            None => return false,
        };
        if total == 0 {
            return false;
        }
        let delta_cells = match direction {
            SplitDirection::Horizontal => to.1 as f64 - from.1 as f64,
            SplitDirection::Vertical => to.0 as f64 - from.0 as f64,
        };
        if delta_cells == 0.0 {
            return false;
        }
        let changed = node.resize(target, delta_cells / total as f64);
        if changed {
            self.relayout();
        }
        changed
    }

    /// Move focus in `direction` from the active pane.
    ///
    /// Returns `Some(true)` when the active pane changed, `Some(false)` when
    /// navigation completed without a change (blocked, no candidate, or
    /// force-wrap landed on the current pane), and `None` when the move was
    /// delegated to the active pane's application and a reply is awaited.
    ///
    /// `override_range` narrows the perpendicular probe window, in tree
    /// cells, `[start, end)`. `force_wrap` probes the far edge regardless of
    /// the active pane's position (used for Enter handling).
    pub fn navigate(
        &mut self,
        direction: NavigateDirection,
        wrap_mode: WrapMode,
        id: Option<String>,
        override_range: Option<(u32, u32)>,
        seamless: SeamlessMode,
        force_wrap: bool,
    ) -> Option<bool> {
        let active = match self.active {
            Some(active) => active,
            None => return Some(false),
        };
        let rows = self.size.rows as u32;
        let cols = self.size.cols as u32;
        let over_start = override_range.map(|r| r.0);
        let over_end = override_range.map(|r| r.1);

        let (entry, candidates, blocked) = {
            let tree = match &self.tree {
                Some(tree) => tree,
                None => return Some(false),
            };
            let entry = match tree.find_pane(active) {
                Some(entry) => entry,
                None => {
                    debug_assert!(false, "active pane missing from layout tree");
                    return Some(false);
                }
            };

            // Wrap decision and probe line. Panes are separated by a single
            // divider cell, hence the 1- and 2-cell offsets from the edges.
            let (candidates, blocked) = match direction {
                NavigateDirection::Left => {
                    let wraps = entry.col() <= 1 || force_wrap;
                    if wraps && wrap_mode == WrapMode::Disallow {
                        (Vec::new(), true)
                    } else {
                        let col = if wraps {
                            cols.saturating_sub(1)
                        } else {
                            entry.col() - 2
                        };
                        (
                            tree.hit_test_vertical_line(
                                col,
                                over_start.unwrap_or(entry.row()),
                                over_end.unwrap_or(entry.row() + entry.rows()),
                            ),
                            false,
                        )
                    }
                }
                NavigateDirection::Right => {
                    let wraps =
                        cols < 2 || entry.col() + entry.cols() >= cols - 2 || force_wrap;
                    if wraps && wrap_mode == WrapMode::Disallow {
                        (Vec::new(), true)
                    } else {
                        let col = if wraps { 0 } else { entry.col() + entry.cols() + 1 };
                        (
                            tree.hit_test_vertical_line(
                                col,
                                over_start.unwrap_or(entry.row()),
                                over_end.unwrap_or(entry.row() + entry.rows()),
                            ),
                            false,
                        )
                    }
                }
                NavigateDirection::Up => {
                    let wraps = entry.row() <= 1 || force_wrap;
                    if wraps && wrap_mode == WrapMode::Disallow {
                        (Vec::new(), true)
                    } else {
                        let row = if wraps {
                            rows.saturating_sub(1)
                        } else {
                            entry.row() - 2
                        };
                        (
                            tree.hit_test_horizontal_line(
                                row,
                                over_start.unwrap_or(entry.col()),
                                over_end.unwrap_or(entry.col() + entry.cols()),
                            ),
                            false,
                        )
                    }
                }
                NavigateDirection::Down => {
                    let wraps =
                        rows < 2 || entry.row() + entry.rows() >= rows - 2 || force_wrap;
                    if wraps && wrap_mode == WrapMode::Disallow {
                        (Vec::new(), true)
                    } else {
                        let row = if wraps { 0 } else { entry.row() + entry.rows() + 1 };
                        (
                            tree.hit_test_horizontal_line(
                                row,
                                over_start.unwrap_or(entry.col()),
                                over_end.unwrap_or(entry.col() + entry.cols()),
                            ),
                            false,
                        )
                    }
                }
            };
            (entry, candidates, blocked)
        };

        let candidate_ids: HashSet<PaneId> = candidates.iter().map(|e| e.pane).collect();
        let valid_candidates = candidate_ids.iter().filter(|c| **c != active).count();

        // A registered active pane gets first claim on the move. When it
        // accepts with wrap disallowed, the answer arrives out of band.
        if seamless == SeamlessMode::Enabled {
            let message = Osc8671 {
                kind: RequestType::Navigate,
                direction: Some(direction),
                id,
                wrap: if wrap_mode == WrapMode::Allow && valid_candidates == 0 {
                    WrapMode::Allow
                } else {
                    WrapMode::Disallow
                },
                ..Default::default()
            };
            let wants_reply = message.wrap == WrapMode::Disallow;
            if let Some(pane) = self.panes.get_mut(&active) {
                if pane.seamless_navigate(&message) {
                    return if wants_reply { None } else { Some(true) };
                }
            }
        }

        if blocked {
            return Some(false);
        }

        // The active pane never competes with the other candidates; when it
        // is the only hit (a forced wrap landing back home), focus stays put.
        let recency: Vec<PaneId> = self.recency.iter().copied().collect();
        for candidate in recency {
            if candidate == active || !candidate_ids.contains(&candidate) {
                continue;
            }

            let candidate_entry = match candidates.iter().find(|e| e.pane == candidate) {
                Some(entry) => *entry,
                None => continue,
            };
            let range = overlap_range(direction, entry, candidate_entry);
            let enter = Osc8671 {
                kind: RequestType::Enter,
                direction: Some(direction),
                range,
                ..Default::default()
            };
            if let Some(pane) = self.panes.get_mut(&candidate) {
                pane.seamless_navigate(&enter);
            }
            self.set_active(Some(candidate));
            return Some(true);
        }
        Some(false)
    }
}

/// The perpendicular-axis extent shared by the previously active pane and
/// the chosen candidate, 1-indexed and inclusive, relative to the
/// candidate's own rectangle. `None` when the panes do not overlap on that
/// axis (possible when a wide probe window was forced).
fn overlap_range(
    direction: NavigateDirection,
    active: LayoutEntry,
    candidate: LayoutEntry,
) -> Option<(u32, u32)> {
    let (a_start, a_extent, c_start, c_extent) = if direction.is_horizontal() {
        (active.row(), active.rows(), candidate.row(), candidate.rows())
    } else {
        (active.col(), active.cols(), candidate.col(), candidate.cols())
    };
    let start = a_start.max(c_start) - c_start + 1;
    let end = (a_start + a_extent)
        .min(c_start + c_extent)
        .saturating_sub(c_start);
    if end < start {
        return None;
    }
    Some((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pane::test_support::SharedBuf;
    use crate::pane::{NullHooks, Pane};
    use crate::protocol::RequestType;
    use std::sync::Arc;

    fn make_pane(buf: &SharedBuf) -> Pane {
        Pane::new(PaneId::new_v4(), Box::new(buf.clone()), Arc::new(NullHooks))
    }

    fn register_pane(tab: &mut Tab, id: PaneId) {
        tab.pane_mut(id).unwrap().handle_app_request(Osc8671 {
            kind: RequestType::Register,
            ..Default::default()
        });
    }

    /// Left pane beside a right pane, 81x24 cells.
    fn two_pane_tab() -> (Tab, PaneId, PaneId, SharedBuf, SharedBuf) {
        let mut tab = Tab::new("main", Size::new(24, 81));
        let left_buf = SharedBuf::default();
        let right_buf = SharedBuf::default();
        let left = make_pane(&left_buf);
        let right = make_pane(&right_buf);
        let (left_id, right_id) = (left.id, right.id);
        tab.add_pane(left, SplitDirection::Horizontal);
        tab.add_pane(right, SplitDirection::Horizontal);
        tab.set_active(Some(left_id));
        (tab, left_id, right_id, left_buf, right_buf)
    }

    /// Left pane, plus a right column split into top and bottom, 81x24.
    fn three_pane_tab() -> (Tab, PaneId, PaneId, PaneId) {
        let mut tab = Tab::new("main", Size::new(24, 81));
        let left = make_pane(&SharedBuf::default());
        let top = make_pane(&SharedBuf::default());
        let bottom = make_pane(&SharedBuf::default());
        let (left_id, top_id, bottom_id) = (left.id, top.id, bottom.id);
        tab.add_pane(left, SplitDirection::Horizontal);
        tab.add_pane(top, SplitDirection::Horizontal);
        tab.add_pane(bottom, SplitDirection::Vertical);
        tab.set_active(Some(left_id));
        (tab, left_id, top_id, bottom_id)
    }

    fn navigate_local(tab: &mut Tab, direction: NavigateDirection) -> Option<bool> {
        tab.navigate(
            direction,
            WrapMode::Allow,
            None,
            None,
            SeamlessMode::Disabled,
            false,
        )
    }

    #[test]
    fn add_pane_makes_it_active() {
        let mut tab = Tab::new("t", Size::new(24, 81));
        let a = make_pane(&SharedBuf::default());
        let b = make_pane(&SharedBuf::default());
        let (a_id, b_id) = (a.id, b.id);
        tab.add_pane(a, SplitDirection::Horizontal);
        assert_eq!(tab.active(), Some(a_id));
        tab.add_pane(b, SplitDirection::Horizontal);
        assert_eq!(tab.active(), Some(b_id));
        assert_eq!(tab.tree().unwrap().entries().len(), 2);
    }

    #[test]
    fn navigate_right_switches_focus() {
        let (mut tab, left, right, _, _) = two_pane_tab();
        assert_eq!(navigate_local(&mut tab, NavigateDirection::Right), Some(true));
        assert_eq!(tab.active(), Some(right));
        // And back again.
        assert_eq!(navigate_local(&mut tab, NavigateDirection::Left), Some(true));
        assert_eq!(tab.active(), Some(left));
    }

    #[test]
    fn navigate_sends_enter_with_overlap_range() {
        let (mut tab, _, right, _, right_buf) = two_pane_tab();
        register_pane(&mut tab, right);
        assert_eq!(navigate_local(&mut tab, NavigateDirection::Right), Some(true));
        // Both panes span rows 0..24, so the overlap is the full height.
        assert_eq!(
            right_buf.contents_string(),
            "\x1b]8671;t=enter:r=1,24;right\x1b\\"
        );
    }

    #[test]
    fn navigate_without_registration_sends_no_enter() {
        let (mut tab, _, right, _, right_buf) = two_pane_tab();
        assert_eq!(navigate_local(&mut tab, NavigateDirection::Right), Some(true));
        assert_eq!(tab.active(), Some(right));
        assert!(right_buf.contents().is_empty());
    }

    #[test]
    fn wrap_disallow_blocks_at_the_edge() {
        let (mut tab, left, _, _, _) = two_pane_tab();
        let result = tab.navigate(
            NavigateDirection::Left,
            WrapMode::Disallow,
            None,
            None,
            SeamlessMode::Disabled,
            false,
        );
        assert_eq!(result, Some(false));
        assert_eq!(tab.active(), Some(left));
    }

    #[test]
    fn wrap_allow_cycles_to_the_far_edge() {
        let (mut tab, _, right, _, _) = two_pane_tab();
        // Moving left from the leftmost pane wraps to the rightmost.
        assert_eq!(navigate_local(&mut tab, NavigateDirection::Left), Some(true));
        assert_eq!(tab.active(), Some(right));
    }

    #[test]
    fn vertical_navigation_between_stacked_panes() {
        let (mut tab, _left, top, bottom) = three_pane_tab();
        tab.set_active(Some(top));
        assert_eq!(navigate_local(&mut tab, NavigateDirection::Down), Some(true));
        assert_eq!(tab.active(), Some(bottom));
        assert_eq!(navigate_local(&mut tab, NavigateDirection::Up), Some(true));
        assert_eq!(tab.active(), Some(top));
    }

    #[test]
    fn left_right_symmetry_restores_focus() {
        let (mut tab, left, _top, _bottom) = three_pane_tab();
        assert_eq!(tab.active(), Some(left));
        assert_eq!(navigate_local(&mut tab, NavigateDirection::Right), Some(true));
        let landed = tab.active().unwrap();
        assert_eq!(navigate_local(&mut tab, NavigateDirection::Left), Some(true));
        assert_eq!(tab.active(), Some(left));
        // With untouched recency the next move right lands on the same pane.
        assert_eq!(navigate_local(&mut tab, NavigateDirection::Right), Some(true));
        assert_eq!(tab.active(), Some(landed));
    }

    #[test]
    fn recency_breaks_ties_between_candidates() {
        let (mut tab, left, top, bottom) = three_pane_tab();
        // Touch bottom most recently, then return to left.
        tab.set_active(Some(bottom));
        tab.set_active(Some(left));
        assert_eq!(navigate_local(&mut tab, NavigateDirection::Right), Some(true));
        assert_eq!(tab.active(), Some(bottom));

        tab.set_active(Some(top));
        tab.set_active(Some(left));
        assert_eq!(navigate_local(&mut tab, NavigateDirection::Right), Some(true));
        assert_eq!(tab.active(), Some(top));
    }

    #[test]
    fn override_range_narrows_the_probe() {
        let (mut tab, left, top, bottom) = three_pane_tab();
        // Touch top most recently so it would win a full-height probe.
        tab.set_active(Some(top));
        tab.set_active(Some(left));
        // Restrict the probe to the bottom half: only the bottom pane hits.
        let bottom_rows = tab.tree().unwrap().find_pane(bottom).unwrap();
        let result = tab.navigate(
            NavigateDirection::Right,
            WrapMode::Allow,
            None,
            Some((bottom_rows.row(), bottom_rows.row() + bottom_rows.rows())),
            SeamlessMode::Disabled,
            false,
        );
        assert_eq!(result, Some(true));
        assert_eq!(tab.active(), Some(bottom));
    }

    #[test]
    fn force_wrap_is_stable_when_only_candidate_is_active() {
        let mut tab = Tab::new("t", Size::new(24, 81));
        let pane = make_pane(&SharedBuf::default());
        let id = pane.id;
        tab.add_pane(pane, SplitDirection::Horizontal);
        let result = tab.navigate(
            NavigateDirection::Left,
            WrapMode::Allow,
            None,
            None,
            SeamlessMode::Enabled,
            true,
        );
        assert_eq!(result, Some(false));
        assert_eq!(tab.active(), Some(id));
    }

    #[test]
    fn force_wrap_still_reaches_other_panes() {
        // A forced wrap right probes the left edge; with the right pane
        // active that is a real move, not a no-op.
        let (mut tab, left, right, _, _) = two_pane_tab();
        tab.set_active(Some(right));
        let result = tab.navigate(
            NavigateDirection::Right,
            WrapMode::Allow,
            None,
            None,
            SeamlessMode::Disabled,
            true,
        );
        assert_eq!(result, Some(true));
        assert_eq!(tab.active(), Some(left));
    }

    #[test]
    fn delegation_to_registered_active_pane_is_pending() {
        let (mut tab, left, _, left_buf, _) = two_pane_tab();
        register_pane(&mut tab, left);
        let result = tab.navigate(
            NavigateDirection::Right,
            WrapMode::Allow,
            Some("req-1".into()),
            None,
            SeamlessMode::Enabled,
            false,
        );
        // A neighbor exists, so the app must answer: wrap is disallowed and
        // the move is left pending.
        assert_eq!(result, None);
        assert_eq!(tab.active(), Some(left));
        assert_eq!(
            left_buf.contents_string(),
            "\x1b]8671;t=navigate:id=req-1;right\x1b\\"
        );
    }

    #[test]
    fn delegation_with_no_alternative_allows_wrap_and_completes() {
        let mut tab = Tab::new("t", Size::new(24, 81));
        let buf = SharedBuf::default();
        let pane = make_pane(&buf);
        let id = pane.id;
        tab.add_pane(pane, SplitDirection::Horizontal);
        register_pane(&mut tab, id);
        let result = tab.navigate(
            NavigateDirection::Down,
            WrapMode::Allow,
            Some("req-2".into()),
            None,
            SeamlessMode::Enabled,
            false,
        );
        // The pane is alone, so the app may wrap internally; no reply needed.
        assert_eq!(result, Some(true));
        assert_eq!(
            buf.contents_string(),
            "\x1b]8671;t=navigate:w=true:id=req-2;down\x1b\\"
        );
    }

    #[test]
    fn unregistered_active_pane_falls_back_to_local_navigation() {
        let (mut tab, _, right, _, _) = two_pane_tab();
        let result = tab.navigate(
            NavigateDirection::Right,
            WrapMode::Allow,
            Some("req-3".into()),
            None,
            SeamlessMode::Enabled,
            false,
        );
        assert_eq!(result, Some(true));
        assert_eq!(tab.active(), Some(right));
    }

    #[test]
    fn navigate_with_no_active_pane_is_a_no_op() {
        let mut tab = Tab::new("t", Size::new(24, 81));
        assert_eq!(navigate_local(&mut tab, NavigateDirection::Up), Some(false));
    }

    #[test]
    fn overlap_range_is_relative_to_the_candidate() {
        // Left pane full height, right column split into top and bottom.
        let mut tab = Tab::new("t", Size::new(24, 81));
        let left_buf = SharedBuf::default();
        let left = make_pane(&left_buf);
        let top = make_pane(&SharedBuf::default());
        let bottom = make_pane(&SharedBuf::default());
        let (left_id, top_id) = (left.id, top.id);
        tab.add_pane(left, SplitDirection::Horizontal);
        tab.add_pane(top, SplitDirection::Horizontal);
        tab.add_pane(bottom, SplitDirection::Vertical);
        register_pane(&mut tab, left_id);

        // From the top-right pane, move left into the full-height pane: the
        // overlap covers only the candidate's first 12 rows.
        tab.set_active(Some(top_id));
        let top_rows = tab.tree().unwrap().find_pane(top_id).unwrap().rows();
        assert_eq!(navigate_local(&mut tab, NavigateDirection::Left), Some(true));
        assert_eq!(
            left_buf.contents_string(),
            format!("\x1b]8671;t=enter:r=1,{top_rows};left\x1b\\")
        );
    }

    #[test]
    fn overlap_range_handles_disjoint_extents() {
        // No shared perpendicular extent yields no range at all.
        let a = LayoutEntry {
            pane: PaneId::new_v4(),
            rect: ratatui::layout::Rect::new(0, 0, 40, 10),
        };
        let b = LayoutEntry {
            pane: PaneId::new_v4(),
            rect: ratatui::layout::Rect::new(41, 15, 40, 9),
        };
        assert_eq!(overlap_range(NavigateDirection::Right, a, b), None);
        // Identical extents cover the candidate fully.
        let c = LayoutEntry {
            pane: PaneId::new_v4(),
            rect: ratatui::layout::Rect::new(41, 0, 40, 10),
        };
        assert_eq!(overlap_range(NavigateDirection::Right, a, c), Some((1, 10)));
    }

    #[test]
    fn remove_pane_promotes_most_recent() {
        let (mut tab, left, _top, bottom) = three_pane_tab();
        tab.set_active(Some(bottom));
        tab.set_active(Some(left));
        assert!(tab.remove_pane(left).is_some());
        assert_eq!(tab.active(), Some(bottom));
        assert_eq!(tab.tree().unwrap().entries().len(), 2);
    }

    #[test]
    fn remove_last_pane_empties_the_tab() {
        let mut tab = Tab::new("t", Size::new(24, 81));
        let pane = make_pane(&SharedBuf::default());
        let id = pane.id;
        tab.add_pane(pane, SplitDirection::Horizontal);
        assert!(tab.remove_pane(id).is_some());
        assert!(tab.is_empty());
        assert!(tab.tree().is_none());
        assert_eq!(tab.active(), None);
    }

    #[test]
    fn replace_pane_keeps_position_and_focus() {
        let (mut tab, left, _, _, _) = two_pane_tab();
        let old_rect = tab.tree().unwrap().find_pane(left).unwrap().rect;
        let replacement = make_pane(&SharedBuf::default());
        let new_id = replacement.id;
        assert!(tab.replace_pane(left, replacement));
        assert_eq!(tab.active(), Some(new_id));
        assert_eq!(tab.tree().unwrap().find_pane(new_id).unwrap().rect, old_rect);
        assert!(tab.pane(left).is_none());
    }

    #[test]
    fn zoom_covers_the_whole_area_and_focus_drops_it() {
        let (mut tab, left, right, _, _) = two_pane_tab();
        assert!(tab.set_zoomed(Some(left)));
        let entries = tab.tree().unwrap().entries().to_vec();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].pane, left);
        assert_eq!(entries[0].rect, Size::new(24, 81).area());

        // Focusing another pane restores the split layout.
        tab.set_active(Some(right));
        assert_eq!(tab.zoomed(), None);
        assert_eq!(tab.tree().unwrap().entries().len(), 2);
    }

    #[test]
    fn drag_divider_moves_the_split() {
        let (mut tab, left, _, _, _) = two_pane_tab();
        let before = tab.tree().unwrap().find_pane(left).unwrap().rect.width;
        // The divider sits just right of the left pane; drag it 8 columns.
        let divider = (5u16, before);
        assert!(tab.drag_divider(divider, (5, before + 8)));
        let after = tab.tree().unwrap().find_pane(left).unwrap().rect.width;
        assert!(after > before, "left pane should widen ({before} -> {after})");
        // A drag that starts inside a pane does nothing.
        assert!(!tab.drag_divider((5, 2), (5, 10)));
    }

    #[test]
    fn focus_events_follow_tab_activity() {
        let mut tab = Tab::new("t", Size::new(24, 81));
        let buf = SharedBuf::default();
        let pane = make_pane(&buf);
        tab.add_pane(pane, SplitDirection::Horizontal);

        assert!(tab.set_is_active(true));
        assert_eq!(buf.contents(), b"\x1b[I".to_vec());
        assert!(tab.set_is_active(false));
        assert_eq!(buf.contents(), b"\x1b[I\x1b[O".to_vec());
        assert!(!tab.set_is_active(false));
    }
}
