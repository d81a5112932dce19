//! Tests for the authorization engine.

use std::collections::BTreeSet;

use rstest::rstest;

use super::*;
use crate::domain::device::{DeviceIdentifier, Location, NewDevice};
use crate::domain::error::ErrorCode;
use crate::domain::ticket::{ErrorType, NewTicket, Reply};
use crate::domain::user::{EmailAddress, NewUser, UserId};

fn types(list: &[DeviceType]) -> BTreeSet<DeviceType> {
    list.iter().copied().collect()
}

fn actor(role: Role, name: &str, allowed: &[DeviceType]) -> Actor {
    Actor {
        id: UserId::random(),
        role,
        name: name.to_owned(),
        allowed_device_types: types(allowed),
    }
}

fn user(role: Role, email: &str, allowed: &[DeviceType]) -> User {
    User::create(NewUser {
        name: "someone".into(),
        email: EmailAddress::new(email).expect("valid email"),
        phone: "0912".into(),
        role,
        allowed_device_types: types(allowed),
        password_hash: "$2b$10$hash".into(),
    })
    .expect("valid draft")
}

fn device(device_type: DeviceType, merchant: &str) -> Device {
    Device::create(NewDevice {
        identifier: DeviceIdentifier::new(Some("SN".into()), None).expect("identifier"),
        device_type,
        model: "m1".into(),
        software_version: "1.0".into(),
        location: Location::new("Tehran".into(), "Tehran".into()).expect("location"),
        merchant: merchant.to_owned(),
        cash_status: None,
    })
    .expect("valid draft")
}

fn ticket(creator: UserId) -> Ticket {
    Ticket::create(NewTicket {
        device: None,
        manual_device: None,
        error_type: ErrorType::new("error1").expect("valid code"),
        manual_error_type: None,
        description: "broken".into(),
        tags: vec![],
        file: None,
        creator,
        condition_label: None,
    })
    .expect("valid draft")
}

fn assert_forbidden(result: Result<(), Error>) {
    let err = result.expect_err("expected denial");
    assert_eq!(err.code(), ErrorCode::Forbidden);
}

mod user_rules {
    use super::*;

    #[rstest]
    #[case(Role::Superadmin, UserListScope::All)]
    #[case(Role::Admin, UserListScope::SelfAndSubordinates)]
    #[case(Role::Expert, UserListScope::SelfOnly)]
    #[case(Role::Agent, UserListScope::SelfOnly)]
    #[case(Role::Acceptor, UserListScope::SelfOnly)]
    fn list_scope_follows_role(#[case] role: Role, #[case] expected: UserListScope) {
        let actor = actor(role, "x", &[DeviceType::Atm]);
        assert_eq!(user_list_scope(&actor), expected);
    }

    #[test]
    fn subordinate_requires_staff_role_and_overlap() {
        let admin = actor(Role::Admin, "admin", &[DeviceType::Atm]);
        let overlapping = user(Role::Expert, "e@x.com", &[DeviceType::Atm, DeviceType::Pos]);
        let disjoint = user(Role::Acceptor, "a@x.com", &[DeviceType::Pos]);
        let peer_admin = user(Role::Admin, "b@x.com", &[DeviceType::Atm]);
        assert!(is_subordinate(&admin, &overlapping));
        assert!(!is_subordinate(&admin, &disjoint));
        assert!(!is_subordinate(&admin, &peer_admin));
    }

    #[test]
    fn superadmin_creates_any_role() {
        let root = actor(Role::Superadmin, "root", &[]);
        assert!(can_create_user(&root, Role::Admin, &types(&[DeviceType::Pos])).is_ok());
        assert!(can_create_user(&root, Role::Superadmin, &BTreeSet::new()).is_ok());
    }

    #[rstest]
    #[case(Role::Admin, &[DeviceType::Atm], false)]
    #[case(Role::Superadmin, &[DeviceType::Atm], false)]
    #[case(Role::Expert, &[DeviceType::Pos], false)]
    #[case(Role::Expert, &[DeviceType::Atm], true)]
    fn admin_creates_overlapping_staff_only(
        #[case] new_role: Role,
        #[case] new_types: &[DeviceType],
        #[case] ok: bool,
    ) {
        let admin = actor(Role::Admin, "admin", &[DeviceType::Atm]);
        let result = can_create_user(&admin, new_role, &types(new_types));
        assert_eq!(result.is_ok(), ok);
    }

    #[test]
    fn staff_may_not_create_users() {
        let agent = actor(Role::Agent, "agent", &[DeviceType::Pos]);
        assert_forbidden(can_create_user(&agent, Role::Agent, &types(&[DeviceType::Pos])));
    }

    #[test]
    fn superadmin_self_edit_excludes_own_role() {
        let target = user(Role::Superadmin, "root@x.com", &[]);
        let mut root = actor(Role::Superadmin, "root", &[]);
        root.id = target.id();
        assert_eq!(
            user_edit_scope(&root, &target).expect("allowed"),
            UserEditScope::FullExceptOwnRole
        );
    }

    #[test]
    fn superadmin_edits_others_fully() {
        let root = actor(Role::Superadmin, "root", &[]);
        let target = user(Role::Admin, "admin@x.com", &[DeviceType::Pos]);
        assert_eq!(
            user_edit_scope(&root, &target).expect("allowed"),
            UserEditScope::Full
        );
    }

    #[test]
    fn admin_self_edit_is_contact_and_password() {
        let target = user(Role::Admin, "admin@x.com", &[DeviceType::Atm]);
        let mut admin = actor(Role::Admin, "admin", &[DeviceType::Atm]);
        admin.id = target.id();
        assert_eq!(
            user_edit_scope(&admin, &target).expect("allowed"),
            UserEditScope::ContactAndPassword
        );
    }

    #[test]
    fn admin_edits_subordinates_fully_and_nobody_else() {
        let admin = actor(Role::Admin, "admin", &[DeviceType::Atm]);
        let subordinate = user(Role::Agent, "agent@x.com", &[DeviceType::Atm]);
        let outsider = user(Role::Agent, "other@x.com", &[DeviceType::Pos]);
        assert_eq!(
            user_edit_scope(&admin, &subordinate).expect("allowed"),
            UserEditScope::Full
        );
        let err = user_edit_scope(&admin, &outsider).expect_err("denied");
        assert_eq!(err.code(), ErrorCode::Forbidden);
    }

    #[test]
    fn staff_edit_only_their_own_password() {
        let target = user(Role::Acceptor, "acc@x.com", &[DeviceType::Pos]);
        let mut acceptor = actor(Role::Acceptor, "acc", &[DeviceType::Pos]);
        acceptor.id = target.id();
        assert_eq!(
            user_edit_scope(&acceptor, &target).expect("allowed"),
            UserEditScope::PasswordOnly
        );
        let other = user(Role::Acceptor, "other@x.com", &[DeviceType::Pos]);
        let err = user_edit_scope(&acceptor, &other).expect_err("denied");
        assert_eq!(err.code(), ErrorCode::Forbidden);
    }

    #[test]
    fn nobody_deletes_themself() {
        for role in [Role::Superadmin, Role::Admin, Role::Agent] {
            let target = user(role, "self@x.com", &[DeviceType::Pos]);
            let mut actor = actor(role, "self", &[DeviceType::Pos]);
            actor.id = target.id();
            assert_forbidden(can_delete_user(&actor, &target));
        }
    }

    #[test]
    fn delete_follows_subordinate_rule() {
        let root = actor(Role::Superadmin, "root", &[]);
        let admin = actor(Role::Admin, "admin", &[DeviceType::Atm]);
        let subordinate = user(Role::Expert, "e@x.com", &[DeviceType::Atm]);
        let outsider = user(Role::Expert, "o@x.com", &[DeviceType::Pos]);
        assert!(can_delete_user(&root, &subordinate).is_ok());
        assert!(can_delete_user(&admin, &subordinate).is_ok());
        assert_forbidden(can_delete_user(&admin, &outsider));
        let agent = actor(Role::Agent, "agent", &[DeviceType::Atm]);
        assert_forbidden(can_delete_user(&agent, &subordinate));
    }
}

mod device_rules {
    use super::*;

    #[rstest]
    #[case(Role::Superadmin, true)]
    #[case(Role::Admin, true)]
    #[case(Role::Expert, false)]
    #[case(Role::Agent, false)]
    #[case(Role::Acceptor, false)]
    fn only_managers_manage_devices(#[case] role: Role, #[case] ok: bool) {
        let actor = actor(role, "x", &[DeviceType::Atm]);
        assert_eq!(can_manage_devices(&actor).is_ok(), ok);
    }

    #[test]
    fn visibility_by_type_for_admin_agent_expert() {
        let atm = device(DeviceType::Atm, "Ali");
        let pos = device(DeviceType::Pos, "Ali");
        for role in [Role::Admin, Role::Agent, Role::Expert] {
            let actor = actor(role, "x", &[DeviceType::Atm]);
            assert!(device_visible(&actor, &atm));
            assert!(!device_visible(&actor, &pos));
        }
    }

    #[test]
    fn acceptor_sees_only_their_merchant_devices() {
        let ali = actor(Role::Acceptor, "Ali", &[DeviceType::Pos]);
        let reza = actor(Role::Acceptor, "Reza", &[DeviceType::Pos]);
        let device = device(DeviceType::Pos, "Ali");
        assert!(device_visible(&ali, &device));
        assert!(!device_visible(&reza, &device));
    }

    #[test]
    fn merchant_match_is_case_sensitive() {
        let actor = actor(Role::Acceptor, "ali", &[DeviceType::Pos]);
        let device = device(DeviceType::Pos, "Ali");
        assert!(!device_visible(&actor, &device));
    }

    #[test]
    fn superadmin_sees_everything() {
        let root = actor(Role::Superadmin, "root", &[]);
        assert!(device_visible(&root, &device(DeviceType::Cashless, "x")));
    }

    #[rstest]
    #[case(DeviceStatus::Active, true)]
    #[case(DeviceStatus::InService, true)]
    #[case(DeviceStatus::NeedsReplenishment, false)]
    #[case(DeviceStatus::NeedsService, false)]
    fn acceptor_status_writes_skip_only_ticketless_values(
        #[case] status: DeviceStatus,
        #[case] ok: bool,
    ) {
        let acceptor = actor(Role::Acceptor, "Ali", &[DeviceType::Atm]);
        let device = device(DeviceType::Atm, "Ali");
        assert_eq!(can_set_device_status(&acceptor, &device, status).is_ok(), ok);
    }

    #[test]
    fn acceptor_may_not_touch_foreign_devices() {
        let acceptor = actor(Role::Acceptor, "Reza", &[DeviceType::Atm]);
        let device = device(DeviceType::Atm, "Ali");
        assert_forbidden(can_set_device_status(&acceptor, &device, DeviceStatus::Active));
    }

    #[test]
    fn managers_set_any_status_and_experts_none() {
        let admin = actor(Role::Admin, "admin", &[DeviceType::Atm]);
        let expert = actor(Role::Expert, "exp", &[DeviceType::Atm]);
        let device = device(DeviceType::Atm, "Ali");
        assert!(can_set_device_status(&admin, &device, DeviceStatus::Empty).is_ok());
        assert_forbidden(can_set_device_status(&expert, &device, DeviceStatus::Active));
    }
}

mod ticket_rules {
    use super::*;

    #[rstest]
    #[case(Role::Agent, true)]
    #[case(Role::Acceptor, true)]
    #[case(Role::Expert, false)]
    #[case(Role::Admin, false)]
    #[case(Role::Superadmin, false)]
    fn creation_is_for_agents_and_acceptors(#[case] role: Role, #[case] ok: bool) {
        let actor = actor(role, "x", &[DeviceType::Pos]);
        assert_eq!(can_create_ticket(&actor).is_ok(), ok);
    }

    #[test]
    fn visibility_rules_per_role() {
        let creator_types = types(&[DeviceType::Atm]);
        let creator = UserId::random();
        let ticket = ticket(creator);

        let root = actor(Role::Superadmin, "root", &[]);
        assert!(ticket_visible(&root, &ticket, &creator_types));

        let admin = actor(Role::Admin, "admin", &[DeviceType::Pos]);
        assert!(ticket_visible(&admin, &ticket, &creator_types));

        let mut owner = actor(Role::Agent, "owner", &[DeviceType::Atm]);
        owner.id = creator;
        assert!(ticket_visible(&owner, &ticket, &creator_types));
        let other_agent = actor(Role::Agent, "other", &[DeviceType::Atm]);
        assert!(!ticket_visible(&other_agent, &ticket, &creator_types));

        let matching_expert = actor(Role::Expert, "e1", &[DeviceType::Atm]);
        assert!(ticket_visible(&matching_expert, &ticket, &creator_types));
        let disjoint_expert = actor(Role::Expert, "e2", &[DeviceType::Pos]);
        assert!(!ticket_visible(&disjoint_expert, &ticket, &creator_types));
    }

    #[test]
    fn conversation_lock_binds_to_the_first_expert() {
        let creator_id = UserId::random();
        let mut ticket = ticket(creator_id);
        let expert_one = actor(Role::Expert, "e1", &[DeviceType::Atm]);
        let expert_two = actor(Role::Expert, "e2", &[DeviceType::Atm]);
        let mut creator = actor(Role::Agent, "g", &[DeviceType::Atm]);
        creator.id = creator_id;

        // Before any expert message both experts may engage.
        assert!(can_send_ticket_message(&expert_one, &ticket).is_ok());
        assert!(can_send_ticket_message(&expert_two, &ticket).is_ok());

        let reply =
            Reply::new(expert_one.id, Some("hello".into()), None).expect("valid reply");
        ticket.push_reply(reply, true);

        assert!(can_send_ticket_message(&expert_one, &ticket).is_ok());
        assert_forbidden(can_send_ticket_message(&expert_two, &ticket));
        assert!(can_send_ticket_message(&creator, &ticket).is_ok());
    }

    #[test]
    fn non_experts_cannot_join_foreign_conversations() {
        let ticket = ticket(UserId::random());
        let admin = actor(Role::Admin, "admin", &[DeviceType::Atm]);
        assert_forbidden(can_send_ticket_message(&admin, &ticket));
    }

    #[rstest]
    #[case(TicketAction::SetPending)]
    #[case(TicketAction::Reply)]
    #[case(TicketAction::SetResolved)]
    #[case(TicketAction::Dispatch)]
    fn structured_actions_are_expert_only(#[case] action: TicketAction) {
        let ticket = ticket(UserId::random());
        let expert = actor(Role::Expert, "e", &[DeviceType::Atm]);
        let agent = actor(Role::Agent, "g", &[DeviceType::Atm]);
        assert!(can_transition(&expert, &ticket, action).is_ok());
        assert_forbidden(can_transition(&agent, &ticket, action));
    }

    #[test]
    fn rejection_is_open_to_expert_and_creator() {
        let creator_id = UserId::random();
        let ticket = ticket(creator_id);
        let expert = actor(Role::Expert, "e", &[DeviceType::Atm]);
        let mut creator = actor(Role::Acceptor, "a", &[DeviceType::Atm]);
        creator.id = creator_id;
        let stranger = actor(Role::Agent, "s", &[DeviceType::Atm]);
        assert!(can_transition(&expert, &ticket, TicketAction::SetRejected).is_ok());
        assert!(can_transition(&creator, &ticket, TicketAction::SetRejected).is_ok());
        assert_forbidden(can_transition(&stranger, &ticket, TicketAction::SetRejected));
    }

    #[test]
    fn confirm_is_creator_only() {
        let creator_id = UserId::random();
        let ticket = ticket(creator_id);
        let mut creator = actor(Role::Acceptor, "a", &[DeviceType::Atm]);
        creator.id = creator_id;
        let expert = actor(Role::Expert, "e", &[DeviceType::Atm]);
        assert!(can_transition(&creator, &ticket, TicketAction::Confirm).is_ok());
        assert_forbidden(can_transition(&expert, &ticket, TicketAction::Confirm));
    }
}
