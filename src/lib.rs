//! Filing obligation classification for taxpayer entities.
//!
//! Facts about an entity are loaded into a [`filing::FactStore`], evaluated against the fixed
//! [`filing::RuleSet`] by the [`filing::FilingEngine`], and packaged as an explainable
//! [`filing::FilingReport`].

pub mod config;
pub mod error;
pub mod filing;
pub mod telemetry;
