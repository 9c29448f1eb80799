//! idxbench — benchmark index construction over daily price/volume panels.
//!
//! Hexagonal architecture: the pipeline and its types live in [`domain`],
//! port traits in [`ports`], concrete implementations in [`adapters`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
