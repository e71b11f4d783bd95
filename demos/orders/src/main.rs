use futures::StreamExt;
use orders::*;
use std::sync::Arc;
use tablebind::*;

fn resolve_binder(registry: Arc<EntityRegistry>) -> Result<Arc<dyn TableBinder>, AppError> {
    let providers = CompositeTableBinderProvider::with_defaults(registry);
    providers
        .try_get_binder(&TypeDescriptor::of::<Queryable<Order>>(), true)?
        .ok_or_else(|| AppError::Configuration("no binder accepts Queryable<Order>".to_string()))
}

fn bind_orders(binder: &Arc<dyn TableBinder>, context: &BindingContext, table_name: &str) -> Result<Queryable<Order>, AppError> {
    binder.bind(context, &TypeDescriptor::of::<Queryable<Order>>(), table_name)?.downcast::<Queryable<Order>>()
}

async fn demo() -> Result<(), AppError> {
    let config = AppConfig::new("config/settings")?;
    let context = BindingContext::from_config(&config);
    let registry = Arc::new(EntityRegistry::from_inventory());
    info!("Registered table entities: {:?}", registry.entity_names());

    let binder = resolve_binder(registry)?;

    let missing = bind_orders(&binder, &context, "Returns")?;
    info!("Table 'Returns' binds to a sequence of {} orders", missing.count());

    seed_orders(context.account_connection_string()?, &get_orders(3))?;

    let mut all = bind_orders(&binder, &context, ORDERS_TABLE)?;
    for order in all.by_ref() {
        let order = order?;
        info!("{}/{}: {} x {} for {} cents", order.customer, order.order_id, order.quantity, order.item, order.total_cents);
    }
    info!("Enumerated all orders in {} requests", all.requests_issued());

    let mut bobs = std::pin::pin!(bind_orders(&binder, &context, ORDERS_TABLE)?.where_partition("bob").into_stream());
    let mut spent = 0;
    while let Some(order) = bobs.next().await {
        spent += order?.total_cents;
    }
    info!("bob spent {} cents", spent);
    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(e) = demo().await {
        error!("Orders demo failed ({:?}): {}", e.class(), e);
        std::process::exit(1);
    }
}
