pub mod activity;
pub mod cost;
pub mod statusline;

pub use statusline::StatusLineRenderer;
