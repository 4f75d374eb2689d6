use chrono::NaiveDate;

/// Homework found in a lesson note. Unique by `(due, subject, text)`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HomeworkItem {
    pub due: NaiveDate,
    pub subject: String,
    pub text: String,
}

/// Exam announced in a lesson note. Unique by `(due, subject)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExamItem {
    pub due: NaiveDate,
    pub subject: String,
    /// Full note text of the lesson that announced the exam.
    pub note: String,
}
