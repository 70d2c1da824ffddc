//! docviewer database layer.
//!
//! Provides SQLite connection management and schema migrations for the
//! session store.
//!
//! # Usage
//!
//! ```no_run
//! use docviewer::database::Database;
//!
//! let db = Database::open("session.db").expect("failed to open database");
//! let conn = db.connection();
//! ```

pub mod connection;
pub mod migrations;

pub use connection::Database;
