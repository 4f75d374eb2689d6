use crate::errors::{AppError, AppResult};
use crate::models::scope::{ExplicitIds, Scope};

/// Pick the query scope. Explicit ids win (student, then teacher, then class);
/// `identity` is only consulted when none is configured.
pub fn resolve_scope<F>(explicit: &ExplicitIds, identity: F) -> AppResult<Scope>
where
    F: FnOnce() -> Option<Scope>,
{
    if let Some(id) = explicit.student_id {
        return Ok(Scope::Student { id });
    }
    if let Some(id) = explicit.teacher_id {
        return Ok(Scope::Teacher { id });
    }
    if let Some(id) = explicit.class_id {
        return Ok(Scope::Class { id });
    }

    identity().ok_or(AppError::NoScope)
}
