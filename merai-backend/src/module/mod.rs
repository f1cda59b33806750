pub mod constellation;
pub mod export;
pub mod pipeline;
pub mod sky;
pub mod wiki;
