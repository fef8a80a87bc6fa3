use std::path::PathBuf;

/// Get models directory from environment variable or use default
pub fn get_models_dir() -> PathBuf {
    std::env::var("STOCKCAST_MODELS_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("models"))
}

/// Get data directory (companies.json) from environment variable or use default
pub fn get_data_dir() -> PathBuf {
    std::env::var("STOCKCAST_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("data"))
}
