//! optset: import cascading spreadsheets as ranked option trees.
//!
//! Each sheet column is one tree level; repeated leading values collapse into shared
//! parents and siblings are ranked in first-seen order.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
