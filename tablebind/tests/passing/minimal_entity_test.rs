use tablebind::*;

#[derive(TableEntity, Default)]
struct Tag {
    #[partition_key]
    scope: String,
    #[row_key]
    name: String,
    r#type: String,
}

fn main() {
    let mut tag = Tag::default();
    tag.set_timestamp(Some(tablebind::chrono::Utc::now()));
    assert!(tag.timestamp().is_none(), "no timestamp field to assign");
    assert!(tag.etag().is_none());

    let mut properties = EntityProperties::new();
    properties.insert("type".to_string(), tablebind::serde_json::json!("label"));
    tag.read_entity(&properties).unwrap();
    assert_eq!(tag.r#type, "label");
    assert_eq!(tag.scope, "");
    assert_eq!(tag.name, "");
}
