mod extract_tests;
mod test_utils;
