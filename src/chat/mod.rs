pub mod client;

pub use client::{AudioUpload, ChatClient, ChatError};
