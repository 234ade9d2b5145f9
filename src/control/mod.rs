//! Receiver control

pub mod volume;


pub use volume::Volume;
