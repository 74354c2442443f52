/// Application name used for cache and config directories.
pub const APP_NAME: &str = "cairn";

/// Length of truncated fingerprints (hex characters).
pub const FINGERPRINT_LEN: usize = 20;

/// Default recipe file name.
pub const RECIPE_FILENAME: &str = "cairn.toml";

/// Resolution cache file name inside the cache directory.
pub const CACHE_FILENAME: &str = "resolutions.json";

/// Environment variable overriding the root for cache and package folders.
pub const HOME_ENV: &str = "CAIRN_HOME";
