pub mod adapter;
pub mod handler;
pub mod parse;

pub use adapter::DiscordAdapter;
pub use handler::{handle_entry, KirokuHandler, Outcome};
pub use parse::{parse_entry, ParsedEntry};
