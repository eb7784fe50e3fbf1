//! Unit tests for Flowboard.

mod geometry_tests;
mod store_tests;
