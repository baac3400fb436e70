pub mod boundary;
pub mod cli;
pub mod config;
pub mod context;
pub mod domain;
pub mod error;
pub mod git;
pub mod pipeline;
pub mod steps;
pub mod ui;

pub use error::{ReleaseError, Result};
