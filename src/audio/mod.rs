//! Audio Path
//!
//! PDM capture callback, single-slot mailbox and the serial streaming loop.

pub mod capture;
pub mod mailbox;
pub mod stream;
