use finder_core::{update, AppState, Msg, Tab};

#[test]
fn teardown_without_polling_is_noop() {
    let state = AppState::new();
    let (next, effects) = update(state.clone(), Msg::Teardown);

    assert_eq!(state, next);
    assert!(effects.is_empty());
}

#[test]
fn reselecting_current_tab_is_noop() {
    let state = AppState::new();
    let (mut next, effects) = update(state.clone(), Msg::TabSelected(Tab::Find));

    assert_eq!(state, next);
    assert!(effects.is_empty());
    assert!(!next.consume_dirty());
}

#[test]
fn clearing_without_job_is_noop() {
    let state = AppState::new();
    let (next, effects) = update(state.clone(), Msg::ClearJobClicked);

    assert_eq!(state, next);
    assert!(effects.is_empty());
}
