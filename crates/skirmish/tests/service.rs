//! Integration tests for the session service façade.
//!
//! Everything here drives the service directly — no sockets — using
//! explicit `SessionContext` values, which is exactly what the context was
//! made explicit for.

use std::sync::Arc;
use std::time::Duration;

use skirmish::protocol::{PlayerId, PositionUpdate, ServerEvent, StateUpdate};
use skirmish::{CombatConfig, RoomSessionService, SessionContext, SyncOutbound};

fn ctx(id: &str) -> SessionContext {
    SessionContext::for_default_room(PlayerId::from(id))
}

/// Service with a short cooldown so multi-attack scenarios don't need
/// real 800 ms waits.
fn fast_service() -> RoomSessionService {
    RoomSessionService::with_config(CombatConfig {
        attack_cooldown_ms: 40,
        ..CombatConfig::default()
    })
}

async fn health_of(service: &RoomSessionService, viewer: &SessionContext, id: &str) -> u32 {
    service
        .get_all_players(viewer)
        .await
        .players
        .into_iter()
        .find(|entry| entry.id == PlayerId::from(id))
        .expect("player should be in the roster")
        .state
        .health
}

// =========================================================================
// join / leave
// =========================================================================

#[tokio::test]
async fn test_join_returns_room_and_spawn_position() {
    let service = RoomSessionService::new();
    let reply = service.join_game(&ctx("p1"), Some("Knight")).await;

    assert!(reply.success);
    assert_eq!(reply.room_id.unwrap().0, "combat-arena");
    let position = reply.position.unwrap();
    assert!((600.0..1400.0).contains(&position.x));
    assert!((600.0..1400.0).contains(&position.y));
}

#[tokio::test]
async fn test_join_starts_at_full_health() {
    let service = RoomSessionService::new();
    service.join_game(&ctx("p1"), None).await;
    assert_eq!(health_of(&service, &ctx("p1"), "p1").await, 100);
}

#[tokio::test]
async fn test_rejoin_overwrites_state() {
    let service = RoomSessionService::new();
    service.join_game(&ctx("p1"), Some("First")).await;
    service
        .update_player_state(
            &ctx("p1"),
            Some(StateUpdate {
                health: Some(5),
                ..StateUpdate::default()
            }),
        )
        .await;

    let reply = service.join_game(&ctx("p1"), Some("Second")).await;

    assert!(reply.success);
    assert_eq!(health_of(&service, &ctx("p1"), "p1").await, 100);
    let roster = service.get_all_players(&ctx("p1")).await;
    assert_eq!(roster.players.len(), 1, "re-join must not duplicate the player");
    assert_eq!(roster.players[0].state.nickname, "Second");
}

#[tokio::test]
async fn test_leave_twice_is_graceful() {
    let service = RoomSessionService::new();
    service.join_game(&ctx("p1"), None).await;

    assert!(service.leave_game(&ctx("p1")).await.success);
    assert!(service.leave_game(&ctx("p1")).await.success);
    assert!(service.get_all_players(&ctx("p1")).await.players.is_empty());
}

// =========================================================================
// update_player_state
// =========================================================================

#[tokio::test]
async fn test_update_rejects_missing_payload() {
    let service = RoomSessionService::new();
    service.join_game(&ctx("p1"), None).await;

    let reply = service.update_player_state(&ctx("p1"), None).await;
    assert!(!reply.success);
}

#[tokio::test]
async fn test_update_merges_into_existing_state() {
    let service = RoomSessionService::new();
    service.join_game(&ctx("p1"), Some("Knight")).await;

    let reply = service
        .update_player_state(
            &ctx("p1"),
            Some(StateUpdate {
                position: Some(PositionUpdate {
                    x: Some(777.0),
                    y: Some(888.0),
                    ..PositionUpdate::default()
                }),
                facing_left: Some(true),
                ..StateUpdate::default()
            }),
        )
        .await;
    assert!(reply.success);

    let roster = service.get_all_players(&ctx("p1")).await;
    let state = &roster.players[0].state;
    assert_eq!(state.position.x, 777.0);
    assert!(state.facing_left);
    // Untouched fields keep their join-time values.
    assert_eq!(state.health, 100);
    assert_eq!(state.nickname, "Knight");
}

#[tokio::test]
async fn test_update_after_leave_fails_without_recreating() {
    let service = RoomSessionService::new();
    service.join_game(&ctx("p1"), None).await;
    service.leave_game(&ctx("p1")).await;

    let reply = service
        .update_player_state(
            &ctx("p1"),
            Some(StateUpdate {
                health: Some(50),
                ..StateUpdate::default()
            }),
        )
        .await;

    assert!(!reply.success);
    assert!(
        service.get_all_players(&ctx("p1")).await.players.is_empty(),
        "a late update must not resurrect the player"
    );
}

// =========================================================================
// attack_player
// =========================================================================

#[tokio::test]
async fn test_attack_unknown_target_reports_message() {
    let service = RoomSessionService::new();
    service.join_game(&ctx("p1"), None).await;

    let reply = service
        .attack_player(&ctx("p1"), &PlayerId::from("ghost"))
        .await;

    assert!(!reply.success);
    assert_eq!(reply.message.as_deref(), Some("target not found"));
}

#[tokio::test]
async fn test_attack_by_nonmember_fails() {
    let service = RoomSessionService::new();
    service.join_game(&ctx("victim"), None).await;

    let reply = service
        .attack_player(&ctx("outsider"), &PlayerId::from("victim"))
        .await;

    assert!(!reply.success);
    assert_eq!(reply.message.as_deref(), Some("attacker not in room"));
    assert_eq!(health_of(&service, &ctx("victim"), "victim").await, 100);
}

#[tokio::test]
async fn test_combat_scenario_attack_cooldown_defeat_respawn() {
    // The full arc: two players join, one lands a hit, gets stopped by the
    // cooldown, wears the other down to zero, and the victim respawns.
    let service = fast_service();
    let a = ctx("a");
    let b = ctx("b");

    service.join_game(&a, Some("Alice")).await;
    service.join_game(&b, Some("Bob")).await;
    assert_eq!(health_of(&service, &a, "b").await, 100);

    // First attack lands.
    let reply = service.attack_player(&a, &b.player).await;
    assert!(reply.success);
    let damage = reply.damage.unwrap();
    assert!((10..=19).contains(&damage));
    assert_eq!(reply.target_health.unwrap(), 100 - damage);
    assert_eq!(health_of(&service, &a, "b").await, 100 - damage);

    // Immediate follow-up is inside the cooldown window.
    let reply = service.attack_player(&a, &b.player).await;
    assert!(!reply.success);
    assert_eq!(reply.message.as_deref(), Some("cooldown"));
    assert_eq!(health_of(&service, &a, "b").await, 100 - damage);

    // Keep attacking (outside the window) until B is defeated.
    let mut last_health = 100 - damage;
    while last_health > 0 {
        tokio::time::sleep(Duration::from_millis(50)).await;
        let reply = service.attack_player(&a, &b.player).await;
        assert!(reply.success);
        let health = reply.target_health.unwrap();
        assert!(health < last_health || health == 0);
        last_health = health;
    }
    assert_eq!(health_of(&service, &a, "b").await, 0);

    // Defeated player respawns with full health at a fresh spawn point.
    let reply = service.respawn_player(&b).await;
    assert!(reply.success);
    let position = reply.position.unwrap();
    assert!((600.0..1400.0).contains(&position.x));
    assert!((600.0..1400.0).contains(&position.y));
    assert_eq!(health_of(&service, &a, "b").await, 100);
}

#[tokio::test]
async fn test_parallel_attacks_yield_single_success() {
    // Two near-simultaneous attack requests must not both pass the
    // cooldown check; the check-and-set is atomic per attacker.
    let service = Arc::new(RoomSessionService::new());
    service.join_game(&ctx("a"), None).await;
    service.join_game(&ctx("b"), None).await;

    let mut handles = Vec::new();
    for _ in 0..8 {
        let service = Arc::clone(&service);
        handles.push(tokio::spawn(async move {
            service
                .attack_player(&ctx("a"), &PlayerId::from("b"))
                .await
        }));
    }

    let mut successes = 0;
    let mut cooldowns = 0;
    for handle in handles {
        let reply = handle.await.unwrap();
        if reply.success {
            successes += 1;
        } else {
            assert_eq!(reply.message.as_deref(), Some("cooldown"));
            cooldowns += 1;
        }
    }

    assert_eq!(successes, 1, "exactly one concurrent attack may land");
    assert_eq!(cooldowns, 7);

    // Exactly one hit's worth of damage was applied.
    let health = health_of(&service, &ctx("a"), "b").await;
    assert!((81..=90).contains(&health), "health = {health}");
}

// =========================================================================
// respawn / roster
// =========================================================================

#[tokio::test]
async fn test_respawn_unknown_player_fails() {
    let service = RoomSessionService::new();
    let reply = service.respawn_player(&ctx("ghost")).await;
    assert!(!reply.success);
    assert_eq!(reply.message.as_deref(), Some("player not found"));
}

#[tokio::test]
async fn test_get_all_players_empty_room() {
    let service = RoomSessionService::new();
    assert!(service.get_all_players(&ctx("p1")).await.players.is_empty());
}

#[tokio::test]
async fn test_roster_lists_players_in_join_order() {
    let service = RoomSessionService::new();
    for id in ["c", "a", "b"] {
        service.join_game(&ctx(id), None).await;
    }

    let ids: Vec<String> = service
        .get_all_players(&ctx("a"))
        .await
        .players
        .into_iter()
        .map(|entry| entry.id.0)
        .collect();
    assert_eq!(ids, ["c", "a", "b"]);
}

// =========================================================================
// broadcast / targeted delivery through the façade
// =========================================================================

#[tokio::test]
async fn test_mutations_broadcast_roster_to_observers() {
    let service = RoomSessionService::new();
    service.join_game(&ctx("a"), None).await;
    let mut rx = service.subscribe(&ctx("a")).await;

    service.join_game(&ctx("b"), None).await;

    // The broadcast happens inside the join critical section, so it is
    // already queued by the time join_game returns.
    match rx.try_recv().expect("observer should see the join") {
        SyncOutbound::Roster(players) => assert_eq!(players.len(), 2),
        other => panic!("expected Roster, got {other:?}"),
    }
}

#[tokio::test]
async fn test_attack_delivers_hit_to_victim() {
    let service = RoomSessionService::new();
    service.join_game(&ctx("a"), None).await;
    service.join_game(&ctx("b"), None).await;
    let mut rx = service.subscribe(&ctx("b")).await;

    let reply = service.attack_player(&ctx("a"), &PlayerId::from("b")).await;
    assert!(reply.success);

    // The victim sees a Hit and a Roster; order between them is not
    // guaranteed, so scan what arrived.
    let mut hit = None;
    while let Ok(outbound) = rx.try_recv() {
        if let SyncOutbound::Event(ServerEvent::Hit { attacker, damage }) = outbound {
            hit = Some((attacker, damage));
        }
    }
    let (attacker, damage) = hit.expect("victim should receive the hit event");
    assert_eq!(attacker, PlayerId::from("a"));
    assert_eq!(damage, reply.damage.unwrap());
}

#[tokio::test]
async fn test_leave_stops_observing() {
    let service = RoomSessionService::new();
    service.join_game(&ctx("a"), None).await;
    service.join_game(&ctx("b"), None).await;
    let mut rx = service.subscribe(&ctx("a")).await;

    service.leave_game(&ctx("a")).await;
    service.join_game(&ctx("c"), None).await;

    // The leave broadcast may have been delivered before the
    // unsubscribe depending on interleaving — but nothing after it.
    let mut after_leave = 0;
    while let Ok(outbound) = rx.try_recv() {
        if let SyncOutbound::Roster(players) = outbound {
            assert!(
                !players.iter().any(|p| p.id == PlayerId::from("c")),
                "ex-member must not see broadcasts after leaving"
            );
            after_leave += 1;
        }
    }
    assert!(after_leave <= 1);
}
