//! Terminal user interface components.

pub mod canvas;
pub mod error;
pub mod player;
pub mod typing;

pub use error::ErrorScreen;
pub use player::{PlayerCommand, PlayerTui};
