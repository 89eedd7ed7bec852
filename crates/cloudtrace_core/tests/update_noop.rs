use cloudtrace_core::{update, AppState, Msg};

#[test]
fn tick_is_noop() {
    let state = AppState::new();
    let (next, effects) = update(state.clone(), Msg::Tick);

    assert_eq!(state, next);
    assert!(effects.is_empty());
}

#[test]
fn stray_start_messages_are_ignored_when_idle() {
    let state = AppState::new();
    let (next, effects) = update(state.clone(), Msg::StartAccepted);
    assert_eq!(state, next);
    assert!(effects.is_empty());

    let (next, effects) = update(state.clone(), Msg::StartFailed { message: None });
    assert_eq!(state, next);
    assert!(effects.is_empty());
}
