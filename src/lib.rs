pub mod collector;
pub mod db;
pub mod normalizer;
pub mod pipeline;
pub mod schema;
pub mod sentiment;
pub mod settings;
pub mod utils;
