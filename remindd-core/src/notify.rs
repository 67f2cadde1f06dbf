//! Reminder composition and outbound notification.
//!
//! The [`Notifier`] turns a task into a human-readable HTML reminder
//! addressed to its owner and hands it to a [`MailTransport`]. The actual
//! delivery mechanism (SMTP or otherwise) is supplied by the embedding
//! process; when no transport is configured the notifier logs the reminder
//! it would have sent and reports success.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::task::{Priority, Task};

/// Contact details for a task owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contact {
    /// Display name.
    pub name: String,
    /// Email address reminders are sent to.
    pub email: String,
}

/// Resolves a task owner's contact details.
///
/// The scheduler expands each matched task with its owner's contact before
/// sending, the way a document store would join the owning user record.
#[async_trait]
pub trait ContactDirectory: Send + Sync {
    /// Returns the contact for the given owner, if one is known.
    async fn contact_for(&self, owner_id: &str) -> Option<Contact>;
}

/// In-memory contact directory, populated by the authentication layer as
/// principals are seen.
#[derive(Default)]
pub struct MemoryDirectory {
    contacts: RwLock<HashMap<String, Contact>>,
}

impl MemoryDirectory {
    /// Creates a new, empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records (or refreshes) the contact for an owner.
    pub async fn upsert(&self, owner_id: &str, contact: Contact) {
        let mut contacts = self.contacts.write().await;
        contacts.insert(owner_id.to_string(), contact);
    }
}

#[async_trait]
impl ContactDirectory for MemoryDirectory {
    async fn contact_for(&self, owner_id: &str) -> Option<Contact> {
        let contacts = self.contacts.read().await;
        contacts.get(owner_id).cloned()
    }
}

/// A composed reminder, ready for an outbound transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderEmail {
    /// Recipient address.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// HTML body.
    pub html: String,
}

/// Errors that can occur when sending a notification.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The transport accepted the message but delivery failed.
    #[error("send failed: {0}")]
    SendFailed(String),
}

/// Outbound mail delivery. Implementations are supplied by the embedding
/// process (SMTP relay, provider API, test double).
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Dispatches one composed reminder.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::SendFailed`] if delivery fails.
    async fn send(&self, email: &ReminderEmail) -> Result<(), NotifyError>;
}

/// Formats and sends reminder emails for tasks.
pub struct Notifier {
    directory: Arc<dyn ContactDirectory>,
    transport: Option<Arc<dyn MailTransport>>,
}

impl Notifier {
    /// Creates a notifier with no outbound transport. Reminders are logged
    /// instead of sent.
    #[must_use]
    pub fn new(directory: Arc<dyn ContactDirectory>) -> Self {
        Self {
            directory,
            transport: None,
        }
    }

    /// Creates a notifier that delivers through the given transport.
    #[must_use]
    pub fn with_transport(
        directory: Arc<dyn ContactDirectory>,
        transport: Arc<dyn MailTransport>,
    ) -> Self {
        Self {
            directory,
            transport: Some(transport),
        }
    }

    /// Composes and dispatches the reminder for one task.
    ///
    /// Succeeds without sending when the owner has no contact on record or
    /// no transport is configured; those cases are logged, never raised.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::SendFailed`] if a configured transport fails.
    pub async fn send_reminder(&self, task: &Task) -> Result<(), NotifyError> {
        let Some(contact) = self.directory.contact_for(&task.owner_id).await else {
            tracing::warn!(
                task_id = %task.id,
                owner_id = %task.owner_id,
                "no contact on record for owner, skipping reminder"
            );
            return Ok(());
        };

        let email = compose(task, &contact);
        match &self.transport {
            None => {
                tracing::info!(
                    task_id = %task.id,
                    to = %email.to,
                    title = %task.title,
                    "mail transport not configured, logging reminder instead"
                );
                Ok(())
            }
            Some(transport) => {
                transport.send(&email).await?;
                tracing::info!(task_id = %task.id, to = %email.to, "reminder email sent");
                Ok(())
            }
        }
    }
}

/// Composes the HTML reminder email for a task addressed to its owner.
#[must_use]
pub fn compose(task: &Task, contact: &Contact) -> ReminderEmail {
    let due = task.due_date.format("%A, %B %e, %Y at %H:%M UTC");
    let description = task.description.as_deref().map_or_else(String::new, |d| {
        format!("<p style=\"color: #6B7280;\">{d}</p>")
    });
    let html = format!(
        "<div style=\"font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;\">\
         <h2 style=\"color: #4F46E5;\">Task Reminder</h2>\
         <div style=\"background-color: #F3F4F6; padding: 20px; border-radius: 8px; margin: 20px 0;\">\
         <h3 style=\"color: #1F2937; margin-top: 0;\">{title}</h3>\
         {description}\
         <div style=\"margin-top: 15px;\">\
         <p style=\"margin: 5px 0;\"><strong>Due Date:</strong> {due}</p>\
         <p style=\"margin: 5px 0;\"><strong>Priority:</strong> \
         <span style=\"text-transform: capitalize; color: {color};\">{priority}</span></p>\
         </div></div>\
         <p style=\"color: #6B7280; font-size: 14px;\">Don't forget to complete this task on time!</p>\
         </div>",
        title = task.title,
        color = priority_color(task.priority),
        priority = task.priority,
    );
    ReminderEmail {
        to: contact.email.clone(),
        subject: format!("Reminder: {}", task.title),
        html,
    }
}

const fn priority_color(priority: Priority) -> &'static str {
    match priority {
        Priority::High => "#EF4444",
        Priority::Medium => "#F59E0B",
        Priority::Low => "#10B981",
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Test doubles shared by the notifier and scheduler test modules.

    use std::sync::Mutex;

    use super::{MailTransport, NotifyError, ReminderEmail};
    use async_trait::async_trait;

    /// Records every email it is asked to send; optionally fails for
    /// specific recipients.
    #[derive(Default)]
    pub struct RecordingTransport {
        pub sent: Mutex<Vec<ReminderEmail>>,
        pub fail_for: Mutex<Vec<String>>,
    }

    impl RecordingTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn fail_for(&self, recipient: &str) {
            self.fail_for
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .push(recipient.to_string());
        }

        pub fn sent_count(&self) -> usize {
            self.sent
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .len()
        }

        pub fn sent_to(&self) -> Vec<String> {
            self.sent
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .iter()
                .map(|e| e.to.clone())
                .collect()
        }
    }

    #[async_trait]
    impl MailTransport for RecordingTransport {
        async fn send(&self, email: &ReminderEmail) -> Result<(), NotifyError> {
            let failing = self
                .fail_for
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .contains(&email.to);
            if failing {
                return Err(NotifyError::SendFailed(format!(
                    "transport refused {}",
                    email.to
                )));
            }
            self.sent
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .push(email.clone());
            Ok(())
        }
    }
}
