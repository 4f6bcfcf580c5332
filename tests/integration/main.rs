//! Integration test modules.

mod badge_engine_test;
