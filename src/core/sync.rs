use crate::config::{Config, PipelineOptions};
use crate::core::pipeline::{CalendarPlan, build_plan};
use crate::core::scope::resolve_scope;
use crate::errors::AppResult;
use crate::export::CalendarSink;
use crate::models::scope::{ExplicitIds, Scope};
use crate::source::TimetableSource;
use crate::utils::date::DateWindow;
use chrono::NaiveDate;

/// Everything validated from the configuration before the source is touched.
#[derive(Debug, Clone)]
pub struct SyncSettings {
    pub opts: PipelineOptions,
    pub window: DateWindow,
    pub explicit: ExplicitIds,
}

impl SyncSettings {
    pub fn from_config(cfg: &Config, today: NaiveDate) -> AppResult<Self> {
        Ok(Self {
            opts: cfg.pipeline_options()?,
            window: cfg.window(today)?,
            explicit: cfg.explicit_ids(),
        })
    }
}

#[derive(Debug)]
pub struct SyncOutcome {
    pub scope: Scope,
    pub window: DateWindow,
    pub plan: CalendarPlan,
}

/// High-level logic of one run: resolve scope → fetch → build → publish.
pub struct SyncLogic;

impl SyncLogic {
    pub fn build<S: TimetableSource>(settings: &SyncSettings, source: &mut S) -> AppResult<SyncOutcome> {
        let scope = resolve_scope(&settings.explicit, || match source.current_identity() {
            Ok(identity) => identity,
            Err(e) => {
                log::warn!("identity lookup failed: {e}");
                None
            }
        })?;
        log::info!("timetable scope: {scope}, window {}", settings.window);

        let raw = source.fetch(&scope, &settings.window)?;
        let plan = build_plan(&raw, &settings.opts);

        Ok(SyncOutcome {
            scope,
            window: settings.window,
            plan,
        })
    }

    /// Hand the complete event set to the sink; nothing is published on earlier failure.
    pub fn publish<K: CalendarSink>(outcome: &SyncOutcome, sink: &mut K) -> AppResult<()> {
        sink.publish(&outcome.window, &outcome.plan.events)
    }
}
