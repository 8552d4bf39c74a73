pub mod engine;
pub mod result;
pub mod trial;
pub mod workers;
