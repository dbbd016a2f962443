pub mod demo;
pub mod fields;
pub mod parse_filter;
