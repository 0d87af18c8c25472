//! egui widgets for the control panel.

mod control_panel;

pub use control_panel::{ControlPanel, PanelResponse};
