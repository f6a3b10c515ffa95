mod occurrence;
mod shared;

pub use occurrence::*;
pub use shared::usecase::{execute, UseCase};
