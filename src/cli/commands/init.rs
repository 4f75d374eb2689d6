use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::ui::messages::{info, success};
use crate::utils::path::expand_tilde;

/// Handle the `init` command: write the default configuration file.
pub fn handle(custom: Option<&str>, force: bool) -> AppResult<()> {
    let path = custom.map(expand_tilde).unwrap_or_else(Config::config_file);

    if path.exists() && !force {
        return Err(AppError::Config(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }

    Config::default().save_to(&path)?;

    success(format!("Config file: {}", path.display()));
    info("Set WebUntis credentials there or via WEBUNTIS_* environment variables.");
    Ok(())
}
