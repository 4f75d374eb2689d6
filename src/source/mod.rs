//! Timetable sources: where raw lessons come from.

pub mod file;
pub mod retry;
pub mod webuntis;

use crate::errors::AppResult;
use crate::models::lesson::RawLesson;
use crate::models::scope::Scope;
use crate::utils::date::DateWindow;

pub use file::JsonFileSource;
pub use retry::{RetryPolicy, Retrying};
pub use webuntis::WebUntisClient;

pub trait TimetableSource {
    /// Identity of the logged-in account, if the source knows one.
    fn current_identity(&mut self) -> AppResult<Option<Scope>>;

    /// Raw lessons of `scope` within `window`.
    fn fetch(&mut self, scope: &Scope, window: &DateWindow) -> AppResult<Vec<RawLesson>>;
}

impl<T: TimetableSource + ?Sized> TimetableSource for Box<T> {
    fn current_identity(&mut self) -> AppResult<Option<Scope>> {
        (**self).current_identity()
    }

    fn fetch(&mut self, scope: &Scope, window: &DateWindow) -> AppResult<Vec<RawLesson>> {
        (**self).fetch(scope, window)
    }
}
