//! Common functionality for solshade.
#![warn(missing_docs)]
pub mod cli;
pub mod geometry;
pub mod id;
pub mod input;
pub mod layout;
pub mod location;
pub mod log;
pub mod model;
pub mod output;
pub mod panel;
pub mod scene;
pub mod settings;
pub mod shadow;
pub mod simulation;
pub mod sun;

#[cfg(test)]
mod fixture;
