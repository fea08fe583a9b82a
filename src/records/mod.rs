pub mod daily_record;
pub mod entry;
pub mod generator;
pub mod store;
