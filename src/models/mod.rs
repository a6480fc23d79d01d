//! Domain models: diesel row structs plus the small closed enums
//! (permission tier, statistics window) used across services.

mod duty;
mod statistics;
mod user;

pub use duty::{DutyWindow, NewDutyWindow};
pub use statistics::{FunctionUsage, StatWindow};
pub use user::{FocusGroup, NewUser, Tier, User, UserSettings};
