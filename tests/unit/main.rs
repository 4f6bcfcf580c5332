//! Unit test modules.

mod leveling_test;
mod special_badges_test;
