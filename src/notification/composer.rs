//! # Notification Composer
//!
//! Pure construction of the completion message. The body keeps the wording and
//! the attachment list layout that existing mail readers already parse.

use crate::config::{ConfigResult, SagaConfig};
use crate::constants::{notification, settings};
use crate::models::{Attachment, NotificationMessage};
use serde::{Deserialize, Serialize};

/// Layout of the attachment segment at the end of the body
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentListStyle {
    /// Every locator is followed by a separator: `a,b,c,`
    #[default]
    TrailingSeparator,
    /// Separators only between locators: `a,b,c`
    Joined,
}

impl AttachmentListStyle {
    pub fn render(self, attachments: &[Attachment]) -> String {
        let locators: Vec<&str> = attachments.iter().map(Attachment::locator).collect();
        let joined = locators.join(notification::ATTACHMENT_SEPARATOR);
        match self {
            AttachmentListStyle::Joined => joined,
            AttachmentListStyle::TrailingSeparator if locators.is_empty() => joined,
            AttachmentListStyle::TrailingSeparator => {
                joined + notification::ATTACHMENT_SEPARATOR
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct NotificationComposer {
    recipient: String,
    style: AttachmentListStyle,
}

impl NotificationComposer {
    pub fn new(recipient: impl Into<String>, style: AttachmentListStyle) -> Self {
        Self {
            recipient: recipient.into(),
            style,
        }
    }

    /// Resolve the recipient once from `EmailSecretaria.Email`; fails if it is absent
    pub fn from_config(config: &SagaConfig) -> ConfigResult<Self> {
        let recipient = config.setting(settings::RECIPIENT_SECTION, settings::RECIPIENT_KEY)?;
        Ok(Self::new(recipient, config.notification.attachment_list_style))
    }

    pub fn recipient(&self) -> &str {
        &self.recipient
    }

    pub fn compose(&self, student_name: &str, attachments: &[Attachment]) -> NotificationMessage {
        let body = format!(
            "{}{}{}{}",
            notification::BODY_PREFIX,
            student_name,
            notification::BODY_FINISHED,
            self.style.render(attachments)
        );
        NotificationMessage::new(self.recipient.clone(), body)
    }
}
