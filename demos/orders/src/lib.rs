use chrono::{DateTime, Utc};
use tablebind::*;

#[derive(TableEntity, Clone, Debug, Default, PartialEq)]
pub struct Order {
    #[partition_key]
    pub customer: String,
    #[row_key]
    pub order_id: String,
    #[timestamp]
    pub timestamp: Option<DateTime<Utc>>,
    #[etag]
    pub etag: Option<String>,
    pub item: String,
    pub quantity: u32,
    pub total_cents: u64,
}

pub const ORDERS_TABLE: &str = "Orders";

const CUSTOMERS: [&str; 3] = ["alice", "bob", "carol"];
const ITEMS: [&str; 4] = ["keyboard", "monitor", "cable", "dock"];

pub fn get_orders(per_customer: u32) -> Vec<Order> {
    let mut orders = Vec::new();
    for customer in CUSTOMERS {
        for n in 0..per_customer {
            let quantity = rand::random_range(1..5);
            orders.push(Order {
                customer: customer.to_string(),
                order_id: format!("{:06}", n),
                item: ITEMS[rand::random_range(0..ITEMS.len())].to_string(),
                quantity,
                total_cents: u64::from(quantity) * rand::random_range(500..20_000),
                ..Order::default()
            });
        }
    }
    orders
}

/// Recreates the orders table so each run starts from the same rows.
pub fn seed_orders(connection_string: &str, orders: &[Order]) -> Result<CloudTable, AppError> {
    let client = StorageAccount::parse(connection_string)?.create_table_client()?;
    let table = client.get_table_reference(ORDERS_TABLE)?;
    table.delete_if_exists()?;
    table.create_if_not_exists()?;
    for order in orders {
        table.insert_or_replace(order)?;
    }
    Ok(table)
}
