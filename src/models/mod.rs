mod account;
mod appointment;
mod catalog;
mod timeslot;

pub use account::*;
pub use appointment::*;
pub use catalog::*;
pub use timeslot::*;
