use tracing::info;

use todo_backend::config::Config;
use todo_backend::proxy::router;
use todo_backend::state::ProxyState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    todo_backend::init_tracing();

    let config = Config::from_env()?;
    let state = ProxyState::new(&config.api_url)?;

    let app = router(state);

    info!("forwarding http://{} -> {}", config.proxy_bind_addr, config.api_url);

    let listener = tokio::net::TcpListener::bind(config.proxy_bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
