//! Submux - Batch MKV Subtitle Conversion
//!
//! A batch tool that scans a directory tree for MKV files carrying image
//! subtitle tracks, converts them to VobSub using mkvtoolnix and BDSup2Sub,
//! and remuxes each file into a `-merged` sibling.

pub mod cli;
pub mod config;
pub mod convert;
pub mod error;
pub mod mkv;
pub mod pipeline;
pub mod scanner;
pub mod scheduler;
