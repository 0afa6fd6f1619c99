//! Test-only helpers shared by the backend integration tests: logging
//! bootstrap, problem-details assertions and unique fixture data.

pub mod logging;
pub mod problem_details;
pub mod unique_helpers;
