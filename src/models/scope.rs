use serde::{Deserialize, Serialize};
use std::fmt;

/// The identity a timetable query is filtered to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Scope {
    Student { id: i64 },
    Teacher { id: i64 },
    Class { id: i64 },
    Person { person_type: i64, person_id: i64 },
}

impl Scope {
    /// WebUntis element type code (1 = class, 2 = teacher, 5 = student).
    pub fn element_type(&self) -> i64 {
        match self {
            Scope::Class { .. } => 1,
            Scope::Teacher { .. } => 2,
            Scope::Student { .. } => 5,
            Scope::Person { person_type, .. } => *person_type,
        }
    }

    pub fn element_id(&self) -> i64 {
        match self {
            Scope::Student { id } | Scope::Teacher { id } | Scope::Class { id } => *id,
            Scope::Person { person_id, .. } => *person_id,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Student { id } => write!(f, "student #{id}"),
            Scope::Teacher { id } => write!(f, "teacher #{id}"),
            Scope::Class { id } => write!(f, "class #{id}"),
            Scope::Person {
                person_type,
                person_id,
            } => write!(f, "person #{person_id} (type {person_type})"),
        }
    }
}

/// Operator-configured identifiers, any of which may be missing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExplicitIds {
    pub student_id: Option<i64>,
    pub teacher_id: Option<i64>,
    pub class_id: Option<i64>,
}

impl ExplicitIds {
    pub fn is_empty(&self) -> bool {
        self.student_id.is_none() && self.teacher_id.is_none() && self.class_id.is_none()
    }
}
