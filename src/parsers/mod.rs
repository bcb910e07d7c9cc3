pub mod lcov;
