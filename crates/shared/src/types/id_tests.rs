use super::*;
use std::str::FromStr;
use uuid::Uuid;

#[test]
fn test_new_ids_are_unique() {
    assert_ne!(BookId::new(), BookId::new());
}

#[test]
fn test_uuid_round_trip_through_from() {
    let uuid = Uuid::new_v4();
    let record_id = BorrowRecordId::from(uuid);
    assert_eq!(Uuid::from(record_id), uuid);
    assert_eq!(record_id.into_inner(), uuid);
}

#[test]
fn test_display_matches_inner_uuid() {
    let uuid = Uuid::new_v4();
    assert_eq!(BookId::from_uuid(uuid).to_string(), uuid.to_string());
}

#[test]
fn test_parse_from_path_segment() {
    let uuid = Uuid::new_v4();
    let id = UserId::from_str(&uuid.to_string()).unwrap();
    assert_eq!(id.into_inner(), uuid);
    assert!(ReviewId::from_str("not-a-uuid").is_err());
}

#[test]
fn test_serializes_as_bare_uuid() {
    let uuid = Uuid::new_v4();
    let json = serde_json::to_string(&AuthorId::from_uuid(uuid)).unwrap();
    assert_eq!(json, format!("\"{uuid}\""));
}
