// docviewer shared type definitions
// Each submodule defines types used across the controller, services and host bridge.

pub mod document;
pub mod errors;
pub mod event;
pub mod session;
pub mod settings;
pub mod tab;
