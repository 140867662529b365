//! Shared test fixtures for the skillsync workspace.
//!
//! This crate provides standardised on-disk layouts so crate test suites do
//! not each hand-roll their own. It is a dev-dependency only and never
//! published.
//!
//! # Modules
//!
//! - [`fixture`]: helpers that write artifact trees and marker directories
//! - [`workspace`]: [`TestWorkspace`] with a collection, projects and a store

pub mod fixture;
pub mod workspace;

pub use workspace::TestWorkspace;
