//! # formlens-core
//!
//! Core library for formlens - ad-hoc analytics over form submissions.
//!
//! This library provides:
//! - Domain types for field definitions, submissions, filters and results
//! - The analysis engine (breakdown and over-time templates)
//! - Configuration management
//! - Logging infrastructure
//!
//! ## Architecture
//!
//! A call flows through three stages:
//! - **Normalize:** raw submissions are reduced to one canonical shape
//! - **Filter:** the conjunctive filter set removes non-matching submissions
//! - **Analyze:** the template's analyzer groups, aggregates and rates the data
//!
//! ## Example
//!
//! ```rust,no_run
//! use formlens_core::analytics::create_default_engine;
//! use formlens_core::{AnalysisOptions, Config, FieldDefinition, Submission};
//!
//! let config = Config::load().expect("failed to load config");
//! let engine = create_default_engine(&config.analysis);
//!
//! let fields: Vec<FieldDefinition> = Vec::new();
//! let submissions: Vec<Submission> = Vec::new();
//! # let (rating, team) = (fields[0].clone(), fields[1].clone());
//! let result = engine
//!     .compute(&submissions, "breakdown", &rating, &team, &AnalysisOptions::default())
//!     .expect("analysis failed");
//! println!("{}", serde_json::to_string_pretty(&result).unwrap());
//! ```

// Re-export commonly used items at the crate root
pub use analytics::{AnalysisEngine, SemanticType, TemplateType};
pub use config::Config;
pub use error::{Error, Result};
pub use types::*;

// Public modules
pub mod analytics;
pub mod config;
pub mod error;
pub mod format;
pub mod logging;
pub mod types;
