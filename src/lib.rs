pub mod arena;
pub mod display;
pub mod neat;
