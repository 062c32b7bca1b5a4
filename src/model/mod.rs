mod common;
mod event;
mod match_detail;
mod player;
mod registration;
mod stats;
mod user;

pub use common::*;
pub use event::*;
pub use match_detail::*;
pub use player::*;
pub use registration::*;
pub use stats::*;
pub use user::*;
