pub mod assets;
pub mod curve;
pub mod events;
pub mod input;
pub mod time;
pub mod transform;
