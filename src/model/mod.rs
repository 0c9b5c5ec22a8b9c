pub mod config;
pub mod message;
pub mod profile;
pub mod story_node;
pub mod story_seed;
pub mod story_view;
pub mod transcript;
