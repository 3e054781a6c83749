pub mod client;

pub use client::TandemClient;
