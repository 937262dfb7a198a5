
mod api;
mod board;
mod client;
mod fave;
pub mod oauth;
mod photos;
mod response;
mod wall;

#[cfg(test)]
pub mod mock;
#[cfg(test)]
mod test_server;

pub use api::VkApi;
pub use board::{NewComment, Topic};
pub use client::Client;
pub use fave::Group;
pub use wall::{NewWallPost, WallFilter};
