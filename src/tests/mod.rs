//! Cross-module tests: end-to-end query scenarios and quickcheck properties

mod classifier_tests;
mod property_tests;
mod scenario_tests;
