pub mod config;
pub mod init;
pub mod list;
pub mod sync;

use crate::config::Config;
use crate::core::sync::{SyncLogic, SyncOutcome, SyncSettings};
use crate::errors::AppResult;
use crate::source::retry::with_retry;
use crate::source::{JsonFileSource, RetryPolicy, Retrying, TimetableSource, WebUntisClient};
use crate::utils::date::today_in;
use crate::utils::path::expand_tilde;

/// Open the configured source: a JSON dump when `input` is given, WebUntis otherwise.
/// Both are wrapped in the retry decorator.
pub(crate) fn open_source(cfg: &Config, input: Option<&str>) -> AppResult<Box<dyn TimetableSource>> {
    let policy = RetryPolicy::with_attempts(cfg.retry_attempts);

    if let Some(path) = input {
        let source = JsonFileSource::open(&expand_tilde(path))?;
        return Ok(Box::new(Retrying::new(source, policy)));
    }

    let client = with_retry("login", &policy, || WebUntisClient::login(cfg))?;
    Ok(Box::new(Retrying::new(client, policy)))
}

/// Validate configuration, then open the source and build the event set.
pub(crate) fn build_outcome(cfg: &Config, input: Option<&str>) -> AppResult<SyncOutcome> {
    let settings = SyncSettings::from_config(cfg, today_in(cfg.timezone()?))?;
    let mut source = open_source(cfg, input)?;
    SyncLogic::build(&settings, &mut source)
}
