//! Out-of-order event reconciliation tests
//!
//! Run with: cargo test -p integration-tests --test reconciliation_tests

use std::sync::Arc;
use std::time::Duration;

use chat_core::{EntityCategory, Snowflake};
use chat_gateway::{
    BotSession, EventCache, GatewayEventType, GlobalRateLimit, HandlerRegistry, SessionScheduler,
    SnowflakeCache,
};
use integration_tests::{
    guild_name, init_test_tracing, member_add, message_create, Guild, RecordingHandler,
};
use serde_json::json;

struct Harness {
    session: Arc<BotSession>,
    guilds: Arc<SnowflakeCache<Guild>>,
    channels: Arc<SnowflakeCache<String>>,
    members: Arc<RecordingHandler<Guild>>,
    messages: Arc<RecordingHandler<String>>,
}

fn harness(stale_after: u64) -> Harness {
    init_test_tracing();
    let events = Arc::new(EventCache::with_stale_after(stale_after));
    let guilds = Arc::new(
        SnowflakeCache::new()
            .with_name_mapper(guild_name)
            .with_replay(EntityCategory::Guild, Arc::clone(&events)),
    );
    let channels = Arc::new(
        SnowflakeCache::new().with_replay(EntityCategory::Channel, Arc::clone(&events)),
    );

    let members = RecordingHandler::new(GatewayEventType::GuildMemberAdd, &guilds);
    let messages = RecordingHandler::new(GatewayEventType::MessageCreate, &channels);

    let mut handlers = HandlerRegistry::new();
    handlers.register(GatewayEventType::GuildMemberAdd, members.clone());
    handlers.register(GatewayEventType::MessageCreate, messages.clone());

    let session = BotSession::new(
        Arc::new(SessionScheduler::new(
            GlobalRateLimit::new(),
            Duration::from_secs(5),
        )),
        events,
        handlers,
    );

    Harness {
        session,
        guilds,
        channels,
        members,
        messages,
    }
}

#[tokio::test]
async fn test_events_replay_in_arrival_order_when_entity_arrives() {
    let h = harness(100);

    h.session.dispatch("GUILD_MEMBER_ADD", member_add(42, "x")).unwrap();
    h.session.dispatch("GUILD_MEMBER_ADD", member_add(42, "y")).unwrap();
    assert!(h.members.handled().is_empty());
    assert_eq!(h.session.event_cache().count(), 2);

    h.guilds.insert(Snowflake::new(42), Guild::named("lounge"));

    assert_eq!(
        h.members.handled(),
        vec![member_add(42, "x"), member_add(42, "y")]
    );
    assert_eq!(h.session.event_cache().count(), 0);

    // the entity is cached now, so new events apply immediately
    h.session.dispatch("GUILD_MEMBER_ADD", member_add(42, "z")).unwrap();
    assert_eq!(h.members.handled().len(), 3);
    assert_eq!(h.session.event_cache().count(), 0);
}

#[tokio::test]
async fn test_categories_and_ids_are_independent() {
    let h = harness(100);

    h.session.dispatch("GUILD_MEMBER_ADD", member_add(7, "a")).unwrap();
    h.session.dispatch("MESSAGE_CREATE", message_create(7, "hi")).unwrap();
    h.session.dispatch("GUILD_MEMBER_ADD", member_add(8, "b")).unwrap();

    h.channels.insert(Snowflake::new(7), "general".to_string());
    assert_eq!(h.messages.handled(), vec![message_create(7, "hi")]);
    assert!(h.members.handled().is_empty());

    h.guilds.insert(Snowflake::new(8), Guild::named("other"));
    assert_eq!(h.members.handled(), vec![member_add(8, "b")]);

    let cache = h.session.event_cache();
    assert_eq!(cache.count_for(EntityCategory::Guild, Snowflake::new(7)), 1);
    assert_eq!(cache.count(), 1);
}

#[tokio::test]
async fn test_deleted_entity_discards_pending_events() {
    let h = harness(100);
    let id = Snowflake::new(42);

    h.session.dispatch("GUILD_MEMBER_ADD", member_add(42, "x")).unwrap();
    h.guilds.insert(Snowflake::new(1), Guild::named("unrelated"));
    assert!(h.guilds.discard(id).is_none());

    assert_eq!(h.session.event_cache().count(), 0);
    assert_eq!(h.session.entity_available(EntityCategory::Guild, id), 0);
    assert!(h.members.handled().is_empty());
}

#[tokio::test]
async fn test_unknown_key_and_unknown_event_are_no_ops() {
    let h = harness(100);

    assert_eq!(
        h.session
            .entity_available(EntityCategory::Role, Snowflake::new(99)),
        0
    );
    h.session.dispatch("VOICE_SERVER_UPDATE", json!({})).unwrap();
    assert_eq!(h.session.event_cache().count(), 0);
    assert_eq!(h.session.response_total(), 1);
}

#[tokio::test]
async fn test_stale_events_are_evicted_after_enough_responses() {
    let h = harness(10);

    h.session.dispatch("GUILD_MEMBER_ADD", member_add(5, "old")).unwrap();
    for _ in 0..19 {
        h.session.dispatch("HEARTBEAT_ACK", json!({})).unwrap();
    }
    assert_eq!(h.session.event_cache().count(), 0);

    h.guilds.insert(Snowflake::new(5), Guild::named("late"));
    assert!(h.members.handled().is_empty());
}

#[tokio::test]
async fn test_malformed_payload_is_rejected_not_deferred() {
    let h = harness(100);

    let err = h
        .session
        .dispatch("GUILD_MEMBER_ADD", json!({"guild_id": "not-a-number"}))
        .unwrap_err();
    assert_eq!(err.code(), "INVALID_PAYLOAD");
    assert_eq!(h.session.event_cache().count(), 0);
}

#[tokio::test]
async fn test_name_lookup_on_cached_guilds() {
    let h = harness(100);
    h.guilds.insert(Snowflake::new(1), Guild::named("Lounge"));
    h.guilds.insert(Snowflake::new(2), Guild::named("lounge"));

    assert_eq!(h.guilds.elements_by_name("LOUNGE", true).unwrap().len(), 2);
    assert!(h.channels.elements_by_name("general", false).is_err());
}
