pub mod essay;
pub mod score;
