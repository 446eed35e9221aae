//! # Spyglass — Channel Listener Agent
//!
//! Watches a message channel (fed as NDJSON on stdin by a transport
//! bridge) and turns free-text trading alerts into structured limit-order
//! signals for the semaphore server.
//!
//! ## Flow
//! ```text
//! per message:
//!   1. Read one NDJSON line from the bridge
//!   2. Run the strategy chain: AI (optional) → pattern scanner
//!   3. Validate price ordering (side-dependent, strict)
//!   4. POST → semaphore /add_signal  (409 = already delivered, fine)
//! ```
//!
//! Messages are processed strictly in order, one at a time; a message
//! yields exactly one delivery attempt or nothing.

pub mod ai;
pub mod config;
pub mod extract;
pub mod message;
pub mod metrics;
pub mod order;
pub mod patterns;
pub mod poster;
pub mod prompt;
