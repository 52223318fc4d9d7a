pub mod formatting;

pub use formatting::{clean_text, parse_integer_string, truncate_for_display};
