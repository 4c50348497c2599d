pub mod extractor;
pub mod jwt;
pub mod saga;
pub mod test_utils;
