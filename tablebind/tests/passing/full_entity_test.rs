use tablebind::chrono::{DateTime, Utc};
use tablebind::*;

#[derive(TableEntity, Default)]
pub struct Shipment {
    #[partition_key]
    pub warehouse: String,
    #[row_key]
    pub tracking_number: String,
    #[timestamp]
    pub timestamp: Option<DateTime<Utc>>,
    #[etag]
    pub etag: Option<String>,
    pub weight_grams: u64,
    pub fragile: bool,
    pub labels: Vec<String>,
    #[transient]
    pub cached_route: Option<String>,
}

fn main() {
    let mut shipment = Shipment { warehouse: "prg".into(), tracking_number: "T-1".into(), weight_grams: 1200, ..Default::default() };
    shipment.set_etag(Some("W/\"1\"".into()));
    assert_eq!(shipment.partition_key(), "prg");
    assert_eq!(shipment.etag(), Some("W/\"1\""));

    let properties = shipment.write_entity().unwrap();
    let keys: Vec<&str> = properties.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["fragile", "labels", "weight_grams"]);

    assert!(EntityRegistry::from_inventory().implements_table_entity(&TypeDescriptor::of::<Shipment>()));
    assert!(TypeDescriptor::of::<Queryable<Shipment>>().is_generic());
}
