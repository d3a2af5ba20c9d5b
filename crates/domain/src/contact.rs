//! Contact form messages.

use common::MessageId;
use store::{ContactMessage, NewContactMessage, Store, User};

use crate::error::{DomainError, ValidationError};
use crate::policy::{self, Caller};

/// A contact message with its author, if still known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactDetails {
    pub message: ContactMessage,
    pub customer: Option<User>,
}

/// Service for contact messages.
///
/// Anyone may leave a message; reading and deleting is admin only.
pub struct ContactService<S: Store> {
    store: S,
}

impl<S: Store> ContactService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Records a message. Anonymous messages have no customer.
    #[tracing::instrument(skip(self, message))]
    pub async fn create_message(
        &self,
        caller: Option<&Caller>,
        message: &str,
    ) -> Result<ContactDetails, DomainError> {
        if !policy::can_create_contact_message(caller) {
            return Err(DomainError::forbidden("Contact messages are closed"));
        }
        let message = message.trim();
        if message.is_empty() {
            return Err(ValidationError::field("message", "must not be empty").into());
        }

        let message = self
            .store
            .create_contact_message(NewContactMessage {
                customer_id: caller.map(|c| c.id),
                message: message.to_string(),
            })
            .await?;
        tracing::info!(message_id = %message.id, "Contact message received");
        self.with_customer(message).await
    }

    /// Lists messages, newest first.
    pub async fn list_messages(&self, caller: &Caller) -> Result<Vec<ContactDetails>, DomainError> {
        Self::authorize(caller)?;

        let messages = self.store.list_contact_messages().await?;
        let mut details = Vec::with_capacity(messages.len());
        for message in messages {
            details.push(self.with_customer(message).await?);
        }
        Ok(details)
    }

    pub async fn get_message(
        &self,
        caller: &Caller,
        id: MessageId,
    ) -> Result<ContactDetails, DomainError> {
        Self::authorize(caller)?;

        let message = self
            .store
            .get_contact_message(id)
            .await?
            .ok_or(DomainError::NotFound {
                entity: "contact message",
                id: id.as_i64(),
            })?;
        self.with_customer(message).await
    }

    pub async fn delete_message(&self, caller: &Caller, id: MessageId) -> Result<(), DomainError> {
        Self::authorize(caller)?;
        Ok(self.store.delete_contact_message(id).await?)
    }

    fn authorize(caller: &Caller) -> Result<(), DomainError> {
        if policy::can_manage_contact_messages(caller) {
            Ok(())
        } else {
            Err(DomainError::forbidden(
                "Only administrators can read contact messages",
            ))
        }
    }

    async fn with_customer(&self, message: ContactMessage) -> Result<ContactDetails, DomainError> {
        let customer = match message.customer_id {
            Some(id) => self.store.get_user(id).await?,
            None => None,
        };
        Ok(ContactDetails { message, customer })
    }
}
