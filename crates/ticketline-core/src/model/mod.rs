//! Ticket, event, and issue data model.
//!
//! ## Submodules
//!
//! - [`fields`]: first-match-wins alias table for source ticket fields.
//! - [`ticket`]: the raw source record and its resolved view.
//! - [`event`]: one lifecycle entry in a ticket's event log.
//! - [`status`]: status label classification and vocabulary.
//! - [`issue`]: non-fatal data-quality diagnostics.

pub mod event;
pub mod fields;
pub mod issue;
pub mod status;
pub mod ticket;
