use super::*;

#[test]
fn defaults_to_root_without_state() {
    let dir = tempfile::tempdir().unwrap();
    let nav = FileNavigator::beside(&dir.path().join("tokens.json"));
    assert_eq!(nav.current_location(), "/");
    assert_eq!(nav.path(), dir.path().join("location"));
}

#[test]
fn location_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let token_file = dir.path().join("nested").join("tokens.json");

    FileNavigator::beside(&token_file).navigate("/login?redirect=%2Forders");
    let reopened = FileNavigator::beside(&token_file);
    assert_eq!(reopened.current_location(), "/login?redirect=%2Forders");
}

#[test]
fn garbage_state_falls_back_to_root() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("location"), "not a path").unwrap();
    let nav = FileNavigator::beside(&dir.path().join("tokens.json"));
    assert_eq!(nav.current_location(), "/");
}
