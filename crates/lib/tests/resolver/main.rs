mod cache_tests;
mod resolve_tests;
mod source_tests;
