use super::*;
use chrono::TimeDelta;
use proptest::prelude::*;
use std::collections::HashSet;
use strangers_protocol::ChatPayload;

/// No one is both queued and paired, no one is queued twice, and every session is consistent
fn assert_membership_invariant(lobby: &Lobby) {
    let queued: Vec<PeerId> = lobby.queue.iter().copied().collect();
    let unique: HashSet<&PeerId> = queued.iter().collect();
    assert_eq!(unique.len(), queued.len(), "queue holds duplicates: {queued:?}");

    for id in &queued {
        assert!(lobby.registry.contains(id), "{id} queued but not connected");
        assert!(
            lobby.directory.lookup(id).is_none(),
            "{id} is both queued and paired"
        );
    }

    for session in lobby.directory.sessions() {
        let [a, b] = session.members;
        assert_ne!(a, b, "session {} pairs a participant with itself", session.id);
        for member in [a, b] {
            assert!(lobby.registry.contains(&member), "{member} paired but gone");
            assert_eq!(lobby.directory.lookup(&member), Some(&session.id));
        }
    }

    for id in lobby.registry.ids() {
        if let Some(room_id) = lobby.directory.lookup(id) {
            let session = lobby.directory.session(room_id).expect("mapping to missing session");
            assert!(session.members.contains(id));
        }
    }
}

#[test]
fn duplicate_queue_entry_is_not_paired_with_itself() {
    let mut lobby = Lobby::new();
    let a = lobby.registry.register();
    lobby.queue.push_unchecked(a);
    lobby.queue.push_unchecked(a);

    lobby.try_pair();

    assert_eq!(lobby.session_count(), 0);
    assert_eq!(lobby.waiting(), vec![a]);
    assert_membership_invariant(&lobby);
}

#[test]
fn duplicate_entry_is_dropped_and_matching_continues() {
    let mut lobby = Lobby::new();
    let a = lobby.registry.register();
    let b = lobby.registry.register();
    lobby.queue.push_unchecked(a);
    lobby.queue.push_unchecked(a);
    lobby.queue.push_unchecked(b);

    lobby.try_pair();

    assert_eq!(lobby.directory.peer_of(&a), Some(b));
    assert!(lobby.waiting().is_empty());
    assert_membership_invariant(&lobby);
}

#[test]
fn later_duplicate_does_not_outlive_the_match() {
    let mut lobby = Lobby::new();
    let a = lobby.registry.register();
    let b = lobby.registry.register();
    lobby.queue.push_unchecked(a);
    lobby.queue.push_unchecked(b);
    lobby.queue.push_unchecked(a);

    lobby.try_pair();

    assert_eq!(lobby.directory.peer_of(&b), Some(a));
    assert!(lobby.waiting().is_empty());
    assert_membership_invariant(&lobby);
}

#[test]
fn stale_entry_is_discarded_and_partner_keeps_its_turn() {
    let mut lobby = Lobby::new();
    let gone = PeerId::random();
    let a = lobby.registry.register();
    let b = lobby.registry.register();
    lobby.queue.push_unchecked(gone);
    lobby.queue.push_unchecked(a);

    lobby.try_pair();
    assert_eq!(lobby.waiting(), vec![a]);

    lobby.enqueue(b);
    assert_eq!(lobby.directory.peer_of(&a), Some(b));
    assert_membership_invariant(&lobby);
}

#[test]
fn paired_event_carries_counterpart_profile() {
    let mut lobby = Lobby::new();
    let a = lobby.connect();
    let profile = Profile::from([
        ("userName".to_string(), serde_json::json!("ana")),
        ("age".to_string(), serde_json::json!(25)),
    ]);
    lobby
        .handle(a, ClientRequest::UserInfo { profile: profile.clone() })
        .unwrap();
    let b = lobby.connect();

    let to_b = lobby.poll(&b).unwrap();
    assert!(matches!(
        to_b.last(),
        Some(ServerEvent::Paired { stranger_profile: Some(p), .. }) if *p == profile
    ));
    let to_a = lobby.poll(&a).unwrap();
    assert!(matches!(
        to_a.last(),
        Some(ServerEvent::Paired {
            stranger_profile: None,
            ..
        })
    ));
}

#[derive(Debug, Clone)]
enum Op {
    Connect,
    Disconnect(usize),
    FindNext(usize),
    Chat(usize),
    Poll(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => Just(Op::Connect),
        1 => any::<usize>().prop_map(Op::Disconnect),
        2 => any::<usize>().prop_map(Op::FindNext),
        1 => any::<usize>().prop_map(Op::Chat),
        1 => any::<usize>().prop_map(Op::Poll),
    ]
}

#[test]
fn silent_member_is_disconnected_and_partner_told() {
    let state = ServerState::new();
    let a = state.connect();
    let b = state.connect();
    state.poll(&a).unwrap();
    state.poll(&b).unwrap();

    let later = Utc::now() + TimeDelta::seconds(60);
    state.liveness.borrow_mut().touch(b, later);

    assert_eq!(state.disconnect_silent(later), vec![a]);
    assert_eq!(state.status(&a), None);
    assert_eq!(state.status(&b), Some(ParticipantStatus::Idle));
    assert!(matches!(
        state.poll(&b).unwrap().as_slice(),
        [ServerEvent::StrangerLeft { message }] if message == STRANGER_LEFT_MESSAGE
    ));
}

proptest! {
    #[test]
    fn membership_invariant_holds_for_any_event_sequence(ops in prop::collection::vec(op(), 1..80)) {
        let mut lobby = Lobby::new();
        // Includes disconnected ids so stale ids get exercised too.
        let mut seen: Vec<PeerId> = Vec::new();

        for op in ops {
            match op {
                Op::Connect => seen.push(lobby.connect()),
                Op::Disconnect(i) if !seen.is_empty() => {
                    lobby.disconnect(&seen[i % seen.len()]);
                }
                Op::FindNext(i) if !seen.is_empty() => {
                    let _ = lobby.handle(seen[i % seen.len()], ClientRequest::FindNext);
                }
                Op::Chat(i) if !seen.is_empty() => {
                    let _ = lobby.handle(
                        seen[i % seen.len()],
                        ClientRequest::ChatMessage { id: None, payload: ChatPayload::new() },
                    );
                }
                Op::Poll(i) if !seen.is_empty() => {
                    let _ = lobby.poll(&seen[i % seen.len()]);
                }
                _ => {}
            }
            assert_membership_invariant(&lobby);
        }
    }
}
