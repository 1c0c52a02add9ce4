use ebookify_core::Config;

// Use mimalloc as the global allocator for better performance and lower
// fragmentation, especially when running on musl-based systems inside
// containers.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Load configuration
    let config = Config::from_env()?;

    ebookify_api::telemetry::init();

    // Initialize the application (store, services, routes)
    let (state, router) = ebookify_api::setup::initialize_app(config.clone()).await?;

    // Background retention sweep; the cleanup endpoint provides the
    // on-demand path
    let _cleanup_handle = state.cleanup.clone().start(config.cleanup_interval());

    // Start the server
    ebookify_api::setup::server::start_server(&config, router).await?;

    Ok(())
}
