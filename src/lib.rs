pub mod cli;
pub mod collect;
pub mod coverage;
pub mod detect;
pub mod error;
pub mod merge;
pub mod model;
pub mod parsers;
pub mod writer;
