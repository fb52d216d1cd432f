// =============================================================================
// Application Identity
// =============================================================================

/// Application name in lowercase (for paths and identifiers)
pub const APP_NAME_LOWER: &str = "pgfilter";

/// Unix-style dotfile folder name
pub const APP_DOT_FOLDER: &str = ".pgfilter";

// =============================================================================
// Configuration Files
// =============================================================================

/// Config file name
pub const CONFIG_FILE_NAME: &str = "pgfilter.json";

/// Environment variable for config file path
pub const ENV_CONFIG: &str = "PGFILTER_CONFIG";

// =============================================================================
// Environment Variables
// =============================================================================

/// Environment variable for log level/filter
pub const ENV_LOG: &str = "PGFILTER_LOG";

/// Environment variable for the schema catalog path
pub const ENV_SCHEMA: &str = "PGFILTER_SCHEMA";

/// Environment variable for the SQL backend used when rendering
pub const ENV_BACKEND: &str = "PGFILTER_BACKEND";

/// Environment variable to print resolver metrics after a command
pub const ENV_METRICS: &str = "PGFILTER_METRICS";

// =============================================================================
// Resolver Names
// =============================================================================

/// Metrics label for the compile command
pub const RESOLVER_COMPILE: &str = "compile";

/// Metrics label for the relations command
pub const RESOLVER_RELATIONS: &str = "relations";
