use blog_api::{
    App,
    config::{Env, ServerConfig},
};
use dotenv::dotenv;
use mimalloc::MiMalloc;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() {
    dotenv().ok();

    let env = Env::from_env();
    init_tracing(&env);

    let config = ServerConfig::new_from_env();
    tracing::info!(env = ?config.env, port = config.port, "Starting blog API");

    let app = match App::new(config) {
        Ok(app) => app,
        Err(e) => {
            tracing::error!(?e, "Could not build the database pool");
            std::process::exit(1)
        }
    };

    if let Err(e) = blog_api::serve(app).await {
        tracing::error!(?e, "Server stopped with an error");
        std::process::exit(1)
    }
}

fn init_tracing(env: &Env) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));
    let registry = tracing_subscriber::registry().with(filter);

    match env {
        Env::Production => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        _ => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}
