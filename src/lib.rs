//! Client for the Porter/PaleAle 4.0 protein structure prediction service.
//!
//! A query is POSTed to the service, the job page is taken from the first link in the reply,
//! and that page is polled until the job completes. The result block then gives, per residue,
//! the secondary structure (Porter) and relative solvent accessibility (PaleAle).
//!
//! Porter (secondary structure):
//! * `H` = helix (DSSP classes H, G and I)
//! * `E` = strand (DSSP classes E and B)
//! * `C` = coil (DSSP classes S, T and .)
//!
//! PaleAle (relative solvent accessibility):
//! * `B` = very buried (<=4% accessible)
//! * `b` = somewhat buried (>4% and <=25% accessible)
//! * `e` = somewhat exposed (>25% and <=50% accessible)
//! * `E` = very exposed (>50% accessible)

#[macro_use]
extern crate log;

pub mod client;
pub mod config;
pub mod error;
pub mod input;
pub mod output;
pub mod prediction;
pub mod scrape;

pub use client::{PredictionClient, RawResponse};
pub use config::{ClientConfig, DEFAULT_ENDPOINT};
pub use error::{PredictionError, PredictionResult};
pub use prediction::{Composition, Prediction, Residue, SecondaryStructure, SolventAccessibility};
