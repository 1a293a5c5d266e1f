//! HTTP implementations of the `bot-core` ports.

pub mod github;
pub mod telegram;
pub mod token_service;

pub use github::{GithubClient, GithubConnector};
pub use telegram::{TelegramClient, Update};
pub use token_service::TokenServiceClient;
