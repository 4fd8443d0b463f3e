use std::sync::{Arc, Mutex};

use crate::layout::{PaneId, Size};
use crate::pane::Pane;
use crate::tab::Tab;

/// Layout state shared between the input thread and the reply-delivery
/// callers. Guarded by its own mutex; the pending-queue mutex may be taken
/// before this one, never after.
pub type SharedLayoutState = Arc<Mutex<LayoutState>>;

pub struct LayoutState {
    size: Size,
    tabs: Vec<Tab>,
    active_tab: Option<usize>,
}

impl LayoutState {
    pub fn new(size: Size) -> Self {
        Self {
            size,
            tabs: Vec::new(),
            active_tab: None,
        }
    }

    pub fn shared(size: Size) -> SharedLayoutState {
        Arc::new(Mutex::new(Self::new(size)))
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn resize(&mut self, size: Size) {
        self.size = size;
        for tab in &mut self.tabs {
            tab.layout(size);
        }
    }

    pub fn tabs(&self) -> &[Tab] {
        &self.tabs
    }

    /// Append a tab; the first one becomes active.
    pub fn add_tab(&mut self, mut tab: Tab) -> usize {
        tab.layout(self.size);
        self.tabs.push(tab);
        let index = self.tabs.len() - 1;
        if self.active_tab.is_none() {
            self.set_active_tab(Some(index));
        }
        index
    }

    pub fn remove_tab(&mut self, index: usize) -> Option<Tab> {
        if index >= self.tabs.len() {
            return None;
        }
        let tab = self.tabs.remove(index);
        self.active_tab = match self.active_tab {
            Some(active) if active == index => {
                if self.tabs.is_empty() {
                    None
                } else {
                    let next = active.min(self.tabs.len() - 1);
                    self.tabs[next].set_is_active(true);
                    Some(next)
                }
            }
            Some(active) if active > index => Some(active - 1),
            other => other,
        };
        Some(tab)
    }

    pub fn set_active_tab(&mut self, index: Option<usize>) -> bool {
        let index = match index {
            Some(i) if i < self.tabs.len() => Some(i),
            Some(_) => return false,
            None => None,
        };
        if self.active_tab == index {
            return false;
        }
        if let Some(old) = self.active_tab {
            self.tabs[old].set_is_active(false);
        }
        self.active_tab = index;
        if let Some(new) = index {
            self.tabs[new].set_is_active(true);
        }
        true
    }

    pub fn active_tab(&self) -> Option<&Tab> {
        self.active_tab.map(|i| &self.tabs[i])
    }

    pub fn active_tab_mut(&mut self) -> Option<&mut Tab> {
        let index = self.active_tab?;
        Some(&mut self.tabs[index])
    }

    pub fn active_pane(&self) -> Option<PaneId> {
        self.active_tab()?.active()
    }

    pub fn active_pane_mut(&mut self) -> Option<&mut Pane> {
        self.active_tab_mut()?.active_pane_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::SplitDirection;
    use crate::pane::test_support::SharedBuf;
    use crate::pane::{NullHooks, Pane};
    use std::sync::Arc as StdArc;

    fn tab_with_pane(size: Size) -> (Tab, PaneId) {
        let mut tab = Tab::new("t", size);
        let pane = Pane::new(
            PaneId::new_v4(),
            Box::new(SharedBuf::default()),
            StdArc::new(NullHooks),
        );
        let id = pane.id;
        tab.add_pane(pane, SplitDirection::Horizontal);
        (tab, id)
    }

    #[test]
    fn first_tab_becomes_active() {
        let mut state = LayoutState::new(Size::new(24, 80));
        let (tab, pane) = tab_with_pane(state.size());
        state.add_tab(tab);
        assert!(state.active_tab().unwrap().is_active());
        assert_eq!(state.active_pane(), Some(pane));
    }

    #[test]
    fn switching_tabs_moves_activity() {
        let mut state = LayoutState::new(Size::new(24, 80));
        let (first, _) = tab_with_pane(state.size());
        let (second, second_pane) = tab_with_pane(state.size());
        state.add_tab(first);
        let second_index = state.add_tab(second);
        assert!(state.set_active_tab(Some(second_index)));
        assert!(!state.tabs()[0].is_active());
        assert_eq!(state.active_pane(), Some(second_pane));
        assert!(!state.set_active_tab(Some(7)));
    }

    #[test]
    fn resize_relayouts_tabs() {
        let mut state = LayoutState::new(Size::new(24, 80));
        let (tab, pane) = tab_with_pane(state.size());
        state.add_tab(tab);
        state.resize(Size::new(50, 120));
        let rect = state
            .active_tab()
            .unwrap()
            .tree()
            .unwrap()
            .find_pane(pane)
            .unwrap()
            .rect;
        assert_eq!(rect, Size::new(50, 120).area());
    }

    #[test]
    fn remove_active_tab_promotes_neighbor() {
        let mut state = LayoutState::new(Size::new(24, 80));
        let (first, first_pane) = tab_with_pane(state.size());
        let (second, _) = tab_with_pane(state.size());
        state.add_tab(first);
        state.add_tab(second);
        assert!(state.remove_tab(1).is_some());
        assert_eq!(state.active_pane(), Some(first_pane));
        assert!(state.remove_tab(0).is_some());
        assert!(state.active_tab().is_none());
        assert!(state.remove_tab(0).is_none());
    }
}
