use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::sync::SyncSettings;
use crate::errors::{AppError, AppResult};
use crate::ui::messages::{success, warning};
use crate::utils::date::today_in;
use crate::utils::path::expand_tilde;
use std::process::Command;

/// Handle the `config` subcommand
pub fn handle(cmd: &Commands, cfg: &Config, custom: Option<&str>) -> AppResult<()> {
    if let Commands::Config {
        print_config,
        check,
        edit_config,
        editor,
    } = cmd
    {
        let path = custom.map(expand_tilde).unwrap_or_else(Config::config_file);

        // ---- PRINT CONFIG ----
        if *print_config {
            let mut shown = cfg.clone();
            for secret in [&mut shown.password, &mut shown.caldav_password] {
                if !secret.is_empty() {
                    *secret = "********".to_string();
                }
            }
            println!("📄 Effective configuration ({}):\n", path.display());
            println!("{}", serde_yaml::to_string(&shown)?);
        }

        // ---- CHECK CONFIG ----
        if *check {
            let settings = SyncSettings::from_config(cfg, today_in(cfg.timezone()?))?;
            println!("Time zone : {}", settings.opts.tz);
            println!("Window    : {}", settings.window);
            println!("Merge gap : {} min", settings.opts.merge_gap.num_minutes());
            if settings.explicit.is_empty() {
                println!("Scope     : identity of the logged-in account");
            } else {
                println!("Scope     : {:?}", settings.explicit);
            }
            if !cfg.has_credentials() {
                warning("WebUntis credentials are incomplete; only --input will work.");
            }
            if settings.opts.homework_keywords.is_empty() {
                warning("No homework keywords configured; homework detection is off.");
            }
            if settings.opts.exam_keywords.is_empty() {
                warning("No exam keywords configured; exam detection is off.");
            }
            success("Configuration is valid.");
        }

        // ---- EDIT CONFIG ----
        if *edit_config {
            let default_editor = std::env::var("EDITOR")
                .or_else(|_| std::env::var("VISUAL"))
                .unwrap_or_else(|_| {
                    if cfg!(target_os = "windows") {
                        "notepad".to_string()
                    } else {
                        "nano".to_string()
                    }
                });
            let editor_to_use = editor.clone().unwrap_or_else(|| default_editor.clone());

            match Command::new(&editor_to_use).arg(&path).status() {
                Ok(s) if s.success() => success(format!("Configuration edited with '{editor_to_use}'")),
                _ if editor_to_use != default_editor => {
                    warning(format!(
                        "Editor '{editor_to_use}' not available, falling back to '{default_editor}'"
                    ));
                    match Command::new(&default_editor).arg(&path).status() {
                        Ok(s) if s.success() => {
                            success(format!("Configuration edited with '{default_editor}'"))
                        }
                        _ => {
                            return Err(AppError::Other(format!(
                                "failed to edit configuration with '{default_editor}'"
                            )));
                        }
                    }
                }
                _ => {
                    return Err(AppError::Other(format!(
                        "failed to edit configuration with '{editor_to_use}'"
                    )));
                }
            }
        }
    }

    Ok(())
}
