//! Referral tiers for a dental practice's referring offices.
//!
//! Monthly referral counts are reduced to trailing-window profiles
//! ([`aggregate`]), ranked into VIP / Warm / Cold / Dormant tiers ([`tier`]),
//! and filtered for campaign targeting ([`selector`]). Everything outside
//! [`db`] is pure and synchronous.

pub mod aggregate;
pub mod config;
pub mod db;
pub mod error;
pub mod listing;
pub mod models;
pub mod month;
pub mod report;
pub mod selector;
pub mod tier;

pub use error::{Error, Result};
