mod column;
mod models;

pub use column::*;
pub use models::*;
