pub mod data;
pub mod world;
