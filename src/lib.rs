//! Build, filter and render the KEGG Alzheimer's disease pathway around a
//! selection of biomarker genes.

pub mod cache;
pub mod config;
#[cfg(feature = "diagram")]
pub mod diagram;
pub mod error;
pub mod filter;
pub mod graph;
pub mod info;
pub mod kegg;
pub mod kgml;
pub mod loader;
pub mod pass;
pub mod render;

pub use error::{PathwayError, Result};
