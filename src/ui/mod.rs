//! docviewer view layer.
//!
//! The host page renders whatever [`projection::Projection`] describes; no
//! view state lives outside the session controller.

pub mod projection;
