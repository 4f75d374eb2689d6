pub mod block;
pub mod calendar_event;
pub mod items;
pub mod lesson;
pub mod scope;
