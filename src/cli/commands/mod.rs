mod draft;
mod history;
mod score;
mod serve;

pub use draft::cmd_draft;
pub use history::cmd_history;
pub use score::cmd_score;
pub use serve::cmd_serve;
