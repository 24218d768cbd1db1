use super::LineMode;

#[test]
fn bool_flags_select_mode() {
    assert_eq!(LineMode::from(true), LineMode::WithNewline);
    assert_eq!(LineMode::from(false), LineMode::WithoutNewline);
}

#[test]
fn terminator_matches_mode() {
    assert_eq!(LineMode::WithNewline.terminator(), b"\n".as_slice());
    assert!(LineMode::WithoutNewline.terminator().is_empty());
    assert_eq!(LineMode::default(), LineMode::WithNewline);
}
