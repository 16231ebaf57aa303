pub mod adapters;
pub mod memo;
pub mod render;
