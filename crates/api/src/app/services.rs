//! Service wiring: store selection and the two boundary services.

use std::sync::Arc;

use returnflow_infra::{
    InMemoryReturnStore, LookupOrderService, OrderCatalog, PostgresReturnStore, ReturnStore,
    StaticOrderCatalog, SubmitReturnService,
};

/// Everything the handlers need, shared via `Extension`.
pub struct AppServices {
    pub store: Arc<dyn ReturnStore>,
    pub lookup: LookupOrderService,
    pub submit: SubmitReturnService,
}

impl AppServices {
    pub fn new(store: Arc<dyn ReturnStore>, catalog: Arc<dyn OrderCatalog>) -> Self {
        Self {
            lookup: LookupOrderService::new(catalog, store.clone()),
            submit: SubmitReturnService::new(store.clone()),
            store,
        }
    }
}

/// Build services from the environment: Postgres when `DATABASE_URL` is set,
/// in-memory otherwise. The order catalog is an in-process mirror either way;
/// platform sync is a deployment concern.
pub async fn build_services() -> AppServices {
    let catalog: Arc<dyn OrderCatalog> = Arc::new(StaticOrderCatalog::new());

    match std::env::var("DATABASE_URL") {
        Ok(database_url) => {
            let pool = sqlx::PgPool::connect(&database_url)
                .await
                .expect("failed to connect to Postgres");
            let store = PostgresReturnStore::new(pool);
            store
                .ensure_schema()
                .await
                .expect("failed to ensure database schema");
            tracing::info!("using Postgres store");
            AppServices::new(Arc::new(store), catalog)
        }
        Err(_) => {
            tracing::info!("DATABASE_URL not set; using in-memory store");
            AppServices::new(Arc::new(InMemoryReturnStore::new()), catalog)
        }
    }
}
