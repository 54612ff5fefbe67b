//! Identity store tests

mod observer_tests;
