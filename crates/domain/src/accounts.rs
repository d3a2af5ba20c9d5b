//! Account directory management.

use common::{Role, UserId};
use store::{NewUser, Store, User, UserChanges};

use crate::error::{DomainError, ValidationError};
use crate::policy::{self, Caller};

/// Trims and lower-cases an email address.
///
/// Rejects addresses without a non-empty local part and domain around a
/// single `@`.
pub fn normalize_email(email: &str) -> Result<String, ValidationError> {
    let email = email.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain))
            if !local.is_empty() && !domain.is_empty() && !domain.contains('@') =>
        {
            Ok(email)
        }
        _ => Err(ValidationError::field("email", "must be a valid email address")),
    }
}

/// Fields of an account to create.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewAccount {
    pub email: String,
    /// Defaults to the email when empty.
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

/// Service for managing user accounts.
pub struct AccountService<S: Store> {
    store: S,
}

impl<S: Store> AccountService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Resolves a forwarded user id to a caller. Unknown ids yield `None`.
    pub async fn resolve_caller(&self, id: UserId) -> Result<Option<Caller>, DomainError> {
        Ok(self.store.get_user(id).await?.as_ref().map(Caller::from))
    }

    /// Lists accounts with the customer role.
    pub async fn list_customers(&self, caller: &Caller) -> Result<Vec<User>, DomainError> {
        if !policy::can_list_customers(caller) {
            return Err(DomainError::forbidden("Only administrators can list customers"));
        }
        Ok(self.store.list_users(Some(Role::Customer)).await?)
    }

    pub async fn get_customer(&self, caller: &Caller, id: UserId) -> Result<User, DomainError> {
        if !policy::can_manage_accounts(caller) {
            return Err(DomainError::forbidden("Only administrators can manage accounts"));
        }
        self.load_customer(id).await
    }

    #[tracing::instrument(skip(self, account), fields(caller = %caller.id))]
    pub async fn create_customer(
        &self,
        caller: &Caller,
        account: NewAccount,
    ) -> Result<User, DomainError> {
        if !policy::can_manage_accounts(caller) {
            return Err(DomainError::forbidden("Only administrators can manage accounts"));
        }
        let user = self.insert(account, Role::Customer).await?;
        tracing::info!(user_id = %user.id, "Customer created");
        Ok(user)
    }

    /// Updates profile fields. The role is changed through `set_role`.
    #[tracing::instrument(skip(self, changes), fields(caller = %caller.id))]
    pub async fn update_customer(
        &self,
        caller: &Caller,
        id: UserId,
        changes: UserChanges,
    ) -> Result<User, DomainError> {
        if !policy::can_manage_accounts(caller) {
            return Err(DomainError::forbidden("Only administrators can manage accounts"));
        }
        self.load_customer(id).await?;

        let changes = UserChanges {
            role: None,
            ..changes
        };
        Ok(self.store.update_user(id, changes).await?)
    }

    #[tracing::instrument(skip(self), fields(caller = %caller.id))]
    pub async fn set_role(
        &self,
        caller: &Caller,
        id: UserId,
        role: Role,
    ) -> Result<User, DomainError> {
        if !policy::can_manage_accounts(caller) {
            return Err(DomainError::forbidden("Only administrators can change roles"));
        }
        let user = self
            .store
            .update_user(
                id,
                UserChanges {
                    role: Some(role),
                    ..Default::default()
                },
            )
            .await?;
        tracing::info!(user_id = %id, role = %role, "Role changed");
        Ok(user)
    }

    /// Deletes a customer with their orders. Their contact messages are
    /// kept without an owner.
    #[tracing::instrument(skip(self), fields(caller = %caller.id))]
    pub async fn delete_customer(&self, caller: &Caller, id: UserId) -> Result<(), DomainError> {
        if !policy::can_manage_accounts(caller) {
            return Err(DomainError::forbidden("Only administrators can manage accounts"));
        }
        self.load_customer(id).await?;
        self.store.delete_user(id).await?;
        tracing::info!(user_id = %id, "Customer deleted");
        Ok(())
    }

    /// Creates the admin account if missing, or promotes an existing
    /// account with that email.
    pub async fn ensure_admin(&self, email: &str, username: &str) -> Result<User, DomainError> {
        let email = normalize_email(email)?;

        match self.store.find_user_by_email(&email).await? {
            Some(user) if user.role.is_admin() => {
                tracing::debug!(email = %email, "Admin account already present");
                Ok(user)
            }
            Some(user) => {
                let user = self
                    .store
                    .update_user(
                        user.id,
                        UserChanges {
                            role: Some(Role::Admin),
                            ..Default::default()
                        },
                    )
                    .await?;
                tracing::info!(email = %email, "Promoted existing account to admin");
                Ok(user)
            }
            None => {
                let account = NewAccount {
                    email,
                    username: username.to_string(),
                    ..Default::default()
                };
                let user = self.insert(account, Role::Admin).await?;
                tracing::info!(email = %user.email, "Created admin account");
                Ok(user)
            }
        }
    }

    async fn load_customer(&self, id: UserId) -> Result<User, DomainError> {
        match self.store.get_user(id).await? {
            Some(user) if user.role == Role::Customer => Ok(user),
            _ => Err(DomainError::NotFound {
                entity: "customer",
                id: id.as_i64(),
            }),
        }
    }

    async fn insert(&self, account: NewAccount, role: Role) -> Result<User, DomainError> {
        let email = normalize_email(&account.email)?;
        let username = match account.username.trim() {
            "" => email.clone(),
            name => name.to_string(),
        };

        let user = NewUser {
            email,
            username,
            first_name: account.first_name.trim().to_string(),
            last_name: account.last_name.trim().to_string(),
            role,
        };
        Ok(self.store.create_user(user).await?)
    }
}
