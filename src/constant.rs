/// Application name and metadata constants
pub const APP_QUALIFIER: &str = "com";
pub const APP_ORGANIZATION: &str = "rafaelqsantos";
pub const APP_NAME: &str = "OpenParquet";

/// File holding every persisted preference
pub const PREFERENCES_FILE: &str = "preferences.json";

// Store keys
pub const THEME_KEY: &str = "theme";
pub const RECENT_FILES_KEY: &str = "recent_files";

/// App related Magic Numbers
pub const MAX_RECENT_FILES: usize = 10;
