pub mod reviews;
pub mod tally;
pub mod trends;
