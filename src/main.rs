use dotenvy::dotenv;
use edutech::logging::init_tracing;
use edutech::router::init_router;
use edutech::state::init_app_state;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    init_tracing();

    // Fails fast on missing configuration, notably JWT_SECRET_KEY.
    let state = init_app_state().await?;
    let app = init_router(state);

    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
    println!("🚀 Server running on http://localhost:3000");
    println!("📚 Swagger UI available at http://localhost:3000/docs");
    axum::serve(listener, app).await?;

    Ok(())
}
