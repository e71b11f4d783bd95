use tablebind::*;

#[derive(TableEntity)]
#[table_entity(no_default)]
struct AuditEntry {
    #[partition_key]
    day: String,
    #[row_key]
    sequence: String,
    actor: String,
}

impl AuditEntry {
    fn new(day: &str, sequence: u32, actor: &str) -> Self {
        AuditEntry { day: day.to_string(), sequence: format!("{:010}", sequence), actor: actor.to_string() }
    }
}

fn main() {
    let entry = AuditEntry::new("2024-01-01", 7, "ops");
    assert_eq!(entry.row_key(), "0000000007");
    assert_eq!(entry.actor, "ops");

    let registry = EntityRegistry::from_inventory();
    let descriptor = TypeDescriptor::of::<AuditEntry>();
    assert!(registry.implements_table_entity(&descriptor));
    assert!(registry.verify_default_constructor(&descriptor).is_err());
}
