//! Command handlers

pub mod bif;
pub mod cab;
pub mod key;
pub mod mve;
