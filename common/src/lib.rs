use env_logger::{Builder, Env};

/// Loads `.env` over the process environment and starts the logger.
///
/// The filter defaults to `info`; `RUST_LOG` takes precedence when set.
pub fn setup_env() {
    if let Err(e) = dotenvy::dotenv_override() {
        // A missing .env is normal when credentials come from the shell.
        if !e.not_found() {
            eprintln!("Failed to load .env: {e}");
        }
    }
    Builder::from_env(Env::default().default_filter_or("info")).init();
    log::debug!("Environment loaded");
}
