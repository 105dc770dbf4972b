//! Boots an `axum` server that mounts every demo model's CRUD router under
//! its own path prefix — an end-to-end harness for exercising the CRUD
//! request/response cycle against real models. Table creation is
//! `crm-cli`'s job, run separately before this binary starts.

use crm_orm::{AccessChecker, Unrestricted};
use demo_crm::{model_catalog, schema_registry, Attachment, ChatMessage, Role, User};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let database_url = std::env::var("DATABASE_URL").unwrap_or_else(|_| "postgres://localhost/demo_crm".to_string());
    let pool_size: usize = std::env::var("POOL_SIZE").ok().and_then(|v| v.parse().ok()).unwrap_or(10);
    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

    let pool = crm_orm::create_pool(&database_url, pool_size)?;
    let access: Arc<dyn AccessChecker> = Arc::new(Unrestricted);
    let catalog = Arc::new(model_catalog());
    let schemas = Arc::new(schema_registry(&catalog));

    let app = axum::Router::new()
        .nest("/users", crm_api::crud_router(crm_api::CrudState::<User>::new(pool.clone(), access.clone(), schemas.clone(), catalog.clone())))
        .nest("/role", crm_api::crud_router(crm_api::CrudState::<Role>::new(pool.clone(), access.clone(), schemas.clone(), catalog.clone())))
        .nest(
            "/chat_message",
            crm_api::crud_router(crm_api::CrudState::<ChatMessage>::new(pool.clone(), access.clone(), schemas.clone(), catalog.clone())),
        )
        .nest(
            "/attachment",
            crm_api::crud_router(crm_api::CrudState::<Attachment>::new(pool.clone(), access.clone(), schemas.clone(), catalog.clone())),
        );

    tracing::info!(%bind_addr, "starting demo-crm server");
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
