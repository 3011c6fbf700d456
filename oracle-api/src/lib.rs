mod client;
mod error;
mod verdict;

pub use client::Client;
pub use error::Error;
pub use verdict::Verdict;
