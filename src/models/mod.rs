mod blog;
mod user;

pub use blog::*;
pub use user::*;
