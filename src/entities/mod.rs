pub mod prelude;

pub mod essays;
pub mod payment_references;
pub mod users;
