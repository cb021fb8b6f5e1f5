mod api;
mod client;

pub use api::PlexHttpClient;
pub use client::PlexClient;
