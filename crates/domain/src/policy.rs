//! Access policy.
//!
//! Pure decisions over the caller's identity and role. Services consult
//! these before touching the store; nothing here performs I/O.

use common::{Role, UserId};
use store::{OrderQuery, OwnerGuard, User};

/// The authenticated identity a request runs as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub id: UserId,
    pub role: Role,
}

impl Caller {
    /// Creates a caller.
    pub fn new(id: UserId, role: Role) -> Self {
        Self { id, role }
    }

    /// Creates a customer caller.
    pub fn customer(id: UserId) -> Self {
        Self::new(id, Role::Customer)
    }

    /// Creates an admin caller.
    pub fn admin(id: UserId) -> Self {
        Self::new(id, Role::Admin)
    }

    /// Returns true for admins.
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

impl From<&User> for Caller {
    fn from(user: &User) -> Self {
        Self::new(user.id, user.role)
    }
}

pub fn can_read_order(caller: &Caller, owner: UserId) -> bool {
    caller.is_admin() || caller.id == owner
}

/// `owner` must be the order's current owner, read right before the write.
pub fn can_write_order(caller: &Caller, owner: UserId) -> bool {
    caller.is_admin() || caller.id == owner
}

pub fn can_assign_order_status(caller: &Caller) -> bool {
    caller.is_admin()
}

pub fn can_reassign_order(caller: &Caller) -> bool {
    caller.is_admin()
}

pub fn can_list_customers(caller: &Caller) -> bool {
    caller.is_admin()
}

pub fn can_view_report(caller: &Caller) -> bool {
    caller.is_admin()
}

pub fn can_manage_catalog(caller: &Caller) -> bool {
    caller.is_admin()
}

pub fn can_manage_accounts(caller: &Caller) -> bool {
    caller.is_admin()
}

/// Anyone, including anonymous visitors, may leave a contact message.
pub fn can_create_contact_message(_caller: Option<&Caller>) -> bool {
    true
}

pub fn can_manage_contact_messages(caller: &Caller) -> bool {
    caller.is_admin()
}

/// Orders visible to the caller: all for admins, their own otherwise.
pub fn order_scope(caller: &Caller) -> OrderQuery {
    if caller.is_admin() {
        OrderQuery::all()
    } else {
        OrderQuery::for_customer(caller.id)
    }
}

/// Ownership precondition re-checked inside an order write.
pub fn owner_guard(caller: &Caller) -> OwnerGuard {
    if caller.is_admin() {
        OwnerGuard::Any
    } else {
        OwnerGuard::Owner(caller.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALICE: UserId = UserId::new(1);
    const BOB: UserId = UserId::new(2);

    #[test]
    fn test_admin_reads_and_writes_every_order() {
        let admin = Caller::admin(UserId::new(99));
        assert!(can_read_order(&admin, ALICE));
        assert!(can_write_order(&admin, BOB));
        assert!(can_assign_order_status(&admin));
        assert!(can_reassign_order(&admin));
    }

    #[test]
    fn test_customer_limited_to_own_orders() {
        let alice = Caller::customer(ALICE);
        assert!(can_read_order(&alice, ALICE));
        assert!(can_write_order(&alice, ALICE));
        assert!(!can_read_order(&alice, BOB));
        assert!(!can_write_order(&alice, BOB));
        assert!(!can_assign_order_status(&alice));
        assert!(!can_reassign_order(&alice));
    }

    #[test]
    fn test_admin_only_surfaces() {
        let alice = Caller::customer(ALICE);
        let admin = Caller::admin(BOB);
        for check in [
            can_list_customers,
            can_view_report,
            can_manage_catalog,
            can_manage_accounts,
            can_manage_contact_messages,
        ] {
            assert!(check(&admin));
            assert!(!check(&alice));
        }
    }

    #[test]
    fn test_contact_creation_is_open() {
        assert!(can_create_contact_message(None));
        assert!(can_create_contact_message(Some(&Caller::customer(ALICE))));
    }

    #[test]
    fn test_order_scope() {
        assert_eq!(order_scope(&Caller::admin(ALICE)), OrderQuery::all());
        assert_eq!(
            order_scope(&Caller::customer(ALICE)),
            OrderQuery::for_customer(ALICE)
        );
    }

    #[test]
    fn test_owner_guard() {
        assert_eq!(owner_guard(&Caller::admin(ALICE)), OwnerGuard::Any);
        assert_eq!(
            owner_guard(&Caller::customer(ALICE)),
            OwnerGuard::Owner(ALICE)
        );
    }
}
