//! Bridges built from user reducers

mod helpers;

use std::sync::atomic::Ordering;

use rstest::rstest;
use serde_json::json;

use entity_bridge::prelude::*;
use entity_model::{shared, Collection, EntityMap};
use helpers::{count_notifications, counter_model, growing_collection, Backend};

/// Reducer mutating `collection` and returning it as the state
fn collection_reducer(
    collection: Collection,
) -> impl Fn(&BridgeState, &Action) -> Option<BridgeState> + Send + Sync + 'static {
    move |_: &BridgeState, action: &Action| {
        match action.action_type() {
            "PUSH" => {
                collection.push(action.payload_or_null()).ok()?;
            }
            "POP" => {
                collection.pop().ok()?;
            }
            _ => {}
        }
        Some(BridgeState::entity(collection.clone()))
    }
}

#[rstest]
#[case::minimal(Backend::Minimal)]
#[case::recording(Backend::Recording)]
fn test_entity_dispatch_through_reducer(#[case] backend: Backend) {
    let collection = Collection::from_attributes(vec![json!({}); 3]).unwrap();
    let bridge = backend
        .bridge()
        .reducer(collection_reducer(collection.clone()))
        .build()
        .unwrap();
    let notified = count_notifications(&bridge);

    entity_dispatch(&collection, "POP", None).unwrap();
    entity_dispatch(&collection, "POP", None).unwrap();

    assert_eq!(notified.load(Ordering::SeqCst), 2);
    assert_eq!(collection.len(), 1);
    assert_eq!(bridge.get_state().to_json().as_array().map(Vec::len), Some(1));
}

#[rstest]
#[case::minimal(Backend::Minimal)]
#[case::recording(Backend::Recording)]
fn test_store_dispatch_through_reducer(#[case] backend: Backend) {
    let collection = Collection::from_attributes(vec![json!({}); 3]).unwrap();
    let bridge = backend
        .bridge()
        .reducer(collection_reducer(collection.clone()))
        .build()
        .unwrap();
    let notified = count_notifications(&bridge);

    bridge
        .dispatch(Action::with_payload("PUSH", json!({ "new": true })))
        .unwrap();

    assert_eq!(collection.last().and_then(|m| m.get("new")), Some(json!(true)));
    assert_eq!(notified.load(Ordering::SeqCst), 1);
    assert_eq!(collection.len(), 4);
    assert_eq!(bridge.get_state().to_json().as_array().map(Vec::len), Some(4));
}

#[rstest]
#[case::minimal(Backend::Minimal)]
#[case::recording(Backend::Recording)]
fn test_reducer_without_entity_is_rejected(#[case] backend: Backend) {
    let err = backend
        .bridge()
        .reducer(|_: &BridgeState, _: &Action| Some(BridgeState::Json(json!({}))))
        .build()
        .unwrap_err();

    assert!(matches!(err, BridgeError::MissingDefaultState));
    assert_eq!(
        err.to_string(),
        "create_bridge() - must give an entity or a reducer which returns one"
    );
}

#[test]
fn test_unbound_reducer_ignored_when_configured() {
    let bridge = create_bridge(None)
        .reducer(|state: &BridgeState, action: &Action| {
            let count = state.to_json().as_i64().unwrap_or(0);
            match action.action_type() {
                "INCREMENT" => Some(BridgeState::Json(json!(count + 1))),
                _ => Some(BridgeState::Json(json!(count))),
            }
        })
        .with_config(BridgeConfig::default().with_unbound_forward(UnboundForward::Ignore))
        .build()
        .unwrap();

    assert!(bridge.entity().is_none());
    bridge.dispatch(Action::new("INCREMENT")).unwrap();
    assert_eq!(bridge.get_state().to_json(), json!(1));
}

#[test]
fn test_reducer_returning_none_fails_dispatch() {
    let collection = growing_collection(1);
    let returned = collection.clone();
    let bridge = create_bridge(None)
        .reducer(move |_: &BridgeState, action: &Action| match action.action_type() {
            "FORGET" => None,
            _ => Some(BridgeState::entity(returned.clone())),
        })
        .build()
        .unwrap();

    assert!(matches!(
        bridge.dispatch(Action::new("FORGET")),
        Err(entity_bridge::StoreError::UndefinedReducerResult { .. })
    ));
    assert_eq!(bridge.get_state().to_json(), json!([{}]));
}

#[test]
fn test_map_default_state_binds_every_member() {
    let model = counter_model(3);
    let collection = growing_collection(1);
    let default_state = EntityMap::new()
        .with("model", shared(model.clone()))
        .with("collection", shared(collection.clone()));

    let bridge = create_bridge(None)
        .reducer(|state: &BridgeState, _: &Action| Some(state.clone()))
        .default_state(default_state)
        .build()
        .unwrap();

    bridge.dispatch(Action::new("INCREMENT")).unwrap();
    entity_dispatch(&collection, "PUSH", Some(json!({ "id": 2 }))).unwrap();

    assert_eq!(
        bridge.get_state().to_json(),
        json!({ "model": { "num": 4 }, "collection": [{}, { "id": 2 }] })
    );
}

#[test]
fn test_live_state_shares_entities() {
    let collection = Collection::new();
    let bridge = create_bridge(None)
        .reducer(collection_reducer(collection.clone()))
        .with_config(BridgeConfig::default().with_state_access(StateAccess::Live))
        .build()
        .unwrap();

    let live = bridge.get_state();
    let handle = live.as_entity().cloned().unwrap();
    assert_eq!(handle.to_json(), json!([]));

    collection.push(json!({ "late": true })).unwrap();
    assert_eq!(handle.to_json(), json!([{ "late": true }]));
    assert_eq!(bridge.snapshot(), json!([{ "late": true }]));
}
