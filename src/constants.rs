//! # System Constants
//!
//! Names shared with the workflow engine's process definitions and with the
//! consumers of the completion notification. Changing any of these breaks
//! compatibility with deployed processes or with existing mail readers.

/// Process variables read by the final step
pub mod variables {
    pub const STUDENT_NAME: &str = "studentName";
    pub const CARD_ID: &str = "cardId";
}

/// Recognized `section.key` settings
pub mod settings {
    /// Section holding the secretariat's mailbox
    pub const RECIPIENT_SECTION: &str = "EmailSecretaria";
    pub const RECIPIENT_KEY: &str = "Email";
}

/// Completion notification text
pub mod notification {
    pub const BODY_PREFIX: &str = "Processo de ";
    pub const BODY_FINISHED: &str =
        ", foi terminado. De seguida, seguem os anexos do seu processo. ";
    pub const ATTACHMENT_SEPARATOR: &str = ",";
}

/// Operation names used in step logs
pub mod operations {
    pub const FINISH_PROCESS: &str = "finish_process";
    pub const COMPLETION_GATE: &str = "completion_gate";
    pub const FETCH_ATTACHMENTS: &str = "fetch_attachments";
    pub const DISPATCH_NOTIFICATION: &str = "dispatch_notification";
    pub const RECORD_NOTIFICATION: &str = "record_notification";
    pub const LEDGER_LOOKUP: &str = "ledger_lookup";
}

/// Historic task delete reason the engine uses for normally finished tasks
pub const ENGINE_COMPLETED_REASON: &str = "completed";
