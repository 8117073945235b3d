pub mod achievement;
pub mod pet;
pub mod task;
pub mod user;
