//! Downloader and NetCDF converter for PIOMAS gridded sea-ice model output.
//!
//! The crate fetches raw binary files from the Polar Science Center file
//! index, gunzips them, decodes the flat 32-bit float records into labeled
//! arrays, and writes them into a NetCDF container, stacking same-variable
//! years along a `year` coordinate.

pub mod app;
pub mod catalog;
pub mod config;
pub mod container;
pub mod decode;
pub mod domain;
pub mod error;
pub mod fs_util;
pub mod grid;
pub mod output;
pub mod psc;
