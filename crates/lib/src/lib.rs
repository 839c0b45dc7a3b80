//! qri-build-lib: release orchestration for the qri binary, desktop app and webapp
//!
//! The crate is organised leaves first:
//! - `exec`: external command runner with environment overlays
//! - `util`: filesystem helpers and content hashing
//! - `platform` / `build`: build targets and the per-target compile step
//! - `template` / `archive`: readme rendering and zip packaging
//! - `matrix`: concurrent fan-out over platform x architecture
//! - `release`: the desktop, webapp and homebrew pipelines

pub mod archive;
pub mod build;
pub mod consts;
pub mod exec;
pub mod matrix;
pub mod platform;
pub mod release;
pub mod template;
pub mod util;
