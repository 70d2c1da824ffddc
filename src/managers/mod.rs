// docviewer state managers
// Managers own client-side state: open tabs, the persisted session, navigation history and confirm gates.

pub mod confirm_gate;
pub mod navigation;
pub mod session_manager;
pub mod tab_manager;
