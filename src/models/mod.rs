//! # Saga Step Data Model
//!
//! Plain data exchanged between the final step and its collaborators. None of
//! these types are persisted by the step itself.

pub mod attachment;
pub mod completion;
pub mod external_task;
pub mod notification;
pub mod subtask;

pub use attachment::Attachment;
pub use completion::CompletionResult;
pub use external_task::{ExternalTask, ProcessInstanceRef, ProcessVariables, VariableValue};
pub use notification::NotificationMessage;
pub use subtask::{Subtask, SubtaskStatus};
