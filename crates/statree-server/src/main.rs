//! statree server binary.
//!
//! - Config: first CLI argument, else `STATREE_CONFIG`, else `statree.yaml`
//! - Registry built from the config's `metrics` tree
//! - Query routes under /v1/metrics, liveness on /healthz

use std::net::SocketAddr;
use tracing_subscriber::{fmt, EnvFilter};

use statree_server::{app_state, config, router};

#[tokio::main]
async fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let path = config::resolve_path(
        std::env::args().nth(1),
        std::env::var(config::CONFIG_ENV).ok(),
    );

    let cfg = config::load_from_file(&path).expect("config load failed");
    let listen: SocketAddr = cfg
        .server
        .listen
        .parse()
        .expect("server.listen must be a valid SocketAddr");

    let state = app_state::AppState::new(cfg).expect("registry construction failed");
    let app = router::build_router(state);

    tracing::info!(%listen, config = %path, "statree-server starting");
    let listener = tokio::net::TcpListener::bind(listen).await.expect("failed to bind");

    axum::serve(listener, app).await.expect("server failed");
}
