//! Authorization engine: one decision point for every (actor, action,
//! target) question.
//!
//! Resource services call into this module instead of re-deriving role rules
//! inline. Denials are always [`ErrorCode::Forbidden`], never "not found",
//! so callers can distinguish a missing record from a withheld one.
//!
//! [`ErrorCode::Forbidden`]: crate::domain::ErrorCode::Forbidden

use std::collections::BTreeSet;

use crate::domain::auth::Actor;
use crate::domain::device::{Device, DeviceStatus};
use crate::domain::error::Error;
use crate::domain::ticket::Ticket;
use crate::domain::user::{device_types_overlap, DeviceType, Role, User};

/// Which slice of the user directory an actor may list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserListScope {
    /// Every user.
    All,
    /// Self plus staff users with a device-type overlap.
    SelfAndSubordinates,
    /// Only the actor's own record.
    SelfOnly,
}

/// Which fields of a user record an actor may write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserEditScope {
    /// All fields.
    Full,
    /// All fields except the actor's own role (superadmin self-edit).
    FullExceptOwnRole,
    /// Email, phone, and password only (admin self-edit).
    ContactAndPassword,
    /// Password only (staff self-edit).
    PasswordOnly,
}

/// Visibility slice for the user directory.
pub fn user_list_scope(actor: &Actor) -> UserListScope {
    match actor.role {
        Role::Superadmin => UserListScope::All,
        Role::Admin => UserListScope::SelfAndSubordinates,
        Role::Expert | Role::Agent | Role::Acceptor => UserListScope::SelfOnly,
    }
}

/// An admin's subordinate: a staff user whose allowed device types overlap
/// the admin's own.
pub fn is_subordinate(actor: &Actor, target: &User) -> bool {
    target.role().is_staff()
        && device_types_overlap(&actor.allowed_device_types, target.allowed_device_types())
}

/// Gate user creation on the creator's role and the draft's role/scope.
pub fn can_create_user(
    actor: &Actor,
    new_role: Role,
    new_types: &BTreeSet<DeviceType>,
) -> Result<(), Error> {
    match actor.role {
        Role::Superadmin => Ok(()),
        Role::Admin => {
            if !new_role.is_staff() {
                return Err(Error::forbidden(
                    "admins may only create expert, agent, or acceptor users",
                ));
            }
            if !device_types_overlap(&actor.allowed_device_types, new_types) {
                return Err(Error::forbidden(
                    "created users must share a device type with the admin",
                ));
            }
            Ok(())
        }
        _ => Err(Error::forbidden("you may not create users")),
    }
}

/// Decide which fields of `target` the actor may write, or deny outright.
pub fn user_edit_scope(actor: &Actor, target: &User) -> Result<UserEditScope, Error> {
    let editing_self = actor.id == target.id();
    match actor.role {
        Role::Superadmin if editing_self => Ok(UserEditScope::FullExceptOwnRole),
        Role::Superadmin => Ok(UserEditScope::Full),
        Role::Admin if editing_self => Ok(UserEditScope::ContactAndPassword),
        Role::Admin if is_subordinate(actor, target) => Ok(UserEditScope::Full),
        Role::Admin => Err(Error::forbidden("you may not edit this user")),
        _ if editing_self => Ok(UserEditScope::PasswordOnly),
        _ => Err(Error::forbidden("you may not edit this user")),
    }
}

/// Gate user deletion. Nobody deletes themself.
pub fn can_delete_user(actor: &Actor, target: &User) -> Result<(), Error> {
    if actor.id == target.id() {
        return Err(Error::forbidden("you may not delete your own account"));
    }
    match actor.role {
        Role::Superadmin => Ok(()),
        Role::Admin if is_subordinate(actor, target) => Ok(()),
        _ => Err(Error::forbidden("you may not delete this user")),
    }
}

/// Device create/edit/delete is a manager capability.
pub fn can_manage_devices(actor: &Actor) -> Result<(), Error> {
    if actor.role.is_manager() {
        Ok(())
    } else {
        Err(Error::forbidden("managing devices requires a manager role"))
    }
}

/// Whether a device appears in the actor's listing.
pub fn device_visible(actor: &Actor, device: &Device) -> bool {
    match actor.role {
        Role::Superadmin => true,
        Role::Admin | Role::Agent | Role::Expert => {
            actor.allowed_device_types.contains(&device.device_type())
        }
        // Case-sensitive exact match, consistent with the create path.
        Role::Acceptor => device.merchant() == actor.name,
    }
}

/// Gate a direct device-status write.
///
/// Managers may set any value. Acceptors may only set values that do not
/// require a ticket, and only on devices they can see; everything else must
/// go through ticket creation and confirmation.
pub fn can_set_device_status(
    actor: &Actor,
    device: &Device,
    status: DeviceStatus,
) -> Result<(), Error> {
    if actor.role.is_manager() {
        return Ok(());
    }
    if actor.role != Role::Acceptor {
        return Err(Error::forbidden("you may not change device status"));
    }
    if !device_visible(actor, device) {
        return Err(Error::forbidden("you may not change this device's status"));
    }
    if !status.settable_without_ticket() {
        return Err(Error::forbidden(
            "this status change requires a ticket and creator confirmation",
        ));
    }
    Ok(())
}

/// Tickets are reported by agents and acceptors.
pub fn can_create_ticket(actor: &Actor) -> Result<(), Error> {
    if matches!(actor.role, Role::Agent | Role::Acceptor) {
        Ok(())
    } else {
        Err(Error::forbidden("only agents and acceptors report tickets"))
    }
}

/// Whether a ticket appears in the actor's listing.
///
/// `creator_types` are the allowed device types of the ticket's creator,
/// needed for the expert overlap rule.
pub fn ticket_visible(
    actor: &Actor,
    ticket: &Ticket,
    creator_types: &BTreeSet<DeviceType>,
) -> bool {
    match actor.role {
        Role::Superadmin | Role::Admin => true,
        Role::Agent | Role::Acceptor => ticket.creator() == actor.id,
        Role::Expert => device_types_overlap(&actor.allowed_device_types, creator_types),
    }
}

/// Gate a free-form conversation message.
///
/// The creator may always write. An expert may write until another expert
/// has claimed the thread; the first expert message locks the conversation
/// to that expert.
pub fn can_send_ticket_message(actor: &Actor, ticket: &Ticket) -> Result<(), Error> {
    if actor.id == ticket.creator() {
        return Ok(());
    }
    if actor.role != Role::Expert {
        return Err(Error::forbidden(
            "only the creator and the assigned expert may message this ticket",
        ));
    }
    match ticket.locked_expert() {
        None => Ok(()),
        Some(locked) if locked == actor.id => Ok(()),
        Some(_) => Err(Error::forbidden(
            "another expert already owns this conversation",
        )),
    }
}

/// Structured status-change actions an actor may request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketAction {
    SetPending,
    Reply,
    SetResolved,
    SetRejected,
    Dispatch,
    Confirm,
}

/// Gate a workflow transition. Expert-only for the structured status
/// changes; confirmation is reserved for the ticket's creator; rejection is
/// open to both the creator and experts.
pub fn can_transition(actor: &Actor, ticket: &Ticket, action: TicketAction) -> Result<(), Error> {
    let is_creator = actor.id == ticket.creator();
    let is_expert = actor.role == Role::Expert;
    match action {
        TicketAction::SetPending | TicketAction::Reply | TicketAction::SetResolved
        | TicketAction::Dispatch => {
            if is_expert {
                Ok(())
            } else {
                Err(Error::forbidden("this action is reserved for experts"))
            }
        }
        TicketAction::SetRejected => {
            if is_expert || is_creator {
                Ok(())
            } else {
                Err(Error::forbidden(
                    "only experts or the creator may reject this ticket",
                ))
            }
        }
        TicketAction::Confirm => {
            if is_creator {
                Ok(())
            } else {
                Err(Error::forbidden("only the ticket's creator may confirm it"))
            }
        }
    }
}

#[cfg(test)]
#[path = "authz_tests.rs"]
mod tests;
