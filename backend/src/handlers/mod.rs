pub mod enhance;
pub mod health;
