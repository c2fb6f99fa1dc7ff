pub mod mentions;

pub use mentions::{mentioned_user_ids, parse_mentions, resolve_mentions, Mention};
