//! Output formatters for duplicate listings.
//!
//! # Available Formatters
//!
//! - **Terminal**: one fixed-width line per duplicate, the stable line format
//!   other tools parse
//! - **CSV**: machine-readable export for data analysis and processing
//!
//! Both accept records in the order the engine emitted them and contain no
//! business logic.

pub mod csv;
pub mod terminal;

/// CSV output renderer function.
///
/// See [`csv::render`] for full documentation.
pub use self::csv::render as render_csv;

/// Terminal output renderer function.
///
/// See [`terminal::render`] for full documentation.
pub use self::terminal::render as render_terminal;
