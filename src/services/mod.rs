// docviewer services
// Services talk to the outside world: the document service, its event stream, markdown rendering and settings.

pub mod content_loader;
pub mod document_service;
pub mod live_updates;
pub mod settings_engine;
