#[tokio::main]
async fn main() {
    atrium_observability::init();

    let session_secret = std::env::var("SESSION_SECRET").unwrap_or_else(|_| {
        tracing::warn!("SESSION_SECRET not set; using insecure dev default");
        "dev-secret".to_string()
    });

    let addr = std::env::var("ATRIUM_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

    let app = atrium_api::app::build_app(session_secret).await;

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {addr}: {e}"));

    tracing::info!("listening on {}", listener.local_addr().unwrap());

    axum::serve(listener, app).await.unwrap();
}
