//! Production chain calculator for Dyson Sphere Program.
//!
//! Given a recipe catalog and a choice of buildings, works out the rate of
//! every intermediate and raw material needed to sustain a target output,
//! and how many buildings of each kind run it.

pub mod calculator;
pub mod catalog;
pub mod db;
pub mod error;
pub mod index;
pub mod input;
pub mod models;
pub mod report;
