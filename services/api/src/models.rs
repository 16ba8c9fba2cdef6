//! API models for entities and request payloads

pub mod note;
pub mod task;

pub use note::{NewNote, Note, NoteChanges, NoteSummary, NoteSummaryRequest};
pub use task::{NewSubtask, NewTask, Subtask, SubtaskChanges, Task, TaskChanges, TaskWithSubtasks};
