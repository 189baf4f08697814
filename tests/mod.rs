//! Test suite for docbridge
//!
//! This module organizes all tests

#[cfg(feature = "ssr")]
pub mod common;
