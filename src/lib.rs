#[macro_use]
extern crate diesel;
#[macro_use]
extern crate diesel_derive_enum;
#[macro_use]
extern crate serde_derive;
#[macro_use]
extern crate log;

pub mod schema;
pub mod models;
pub mod error;
pub mod config;
pub mod auth;
pub mod store;
pub mod invites;
pub mod groups;
pub mod predictions;
pub mod scores;
pub mod leaderboard;
pub mod tournaments;
pub mod users;
pub mod app_state;

pub use crate::error::{Error, Result};
