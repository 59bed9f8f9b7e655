/// What the owner of the history panel should do in response to an input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelAction {
    /// Panel just opened: start the refresh timer.
    Opened,
    /// Panel just closed: stop timers and reset the view.
    Closed,
    Unchanged,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OverlayState {
    visible: bool,
}

impl OverlayState {
    pub fn set_visible(&mut self, visible: bool) -> PanelAction {
        let action = match (self.visible, visible) {
            (false, true) => PanelAction::Opened,
            (true, false) => PanelAction::Closed,
            _ => PanelAction::Unchanged,
        };
        self.visible = visible;
        action
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn on_toggle(&mut self) -> PanelAction {
        let target = !self.visible;
        self.set_visible(target)
    }

    pub fn on_escape(&mut self) -> PanelAction {
        if self.visible {
            return self.set_visible(false);
        }
        PanelAction::Unchanged
    }
}
