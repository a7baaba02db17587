/// Entry point for Dockwatch.
///
/// Tracks every running container on the local Docker daemon and publishes its CPU and
/// memory usage to Redis.
///
/// # Errors
///
/// Returns an error if startup fails (e.g., an invalid environment variable, or the Docker
/// socket or Redis server being unreachable).
///
/// # Examples
///
/// ```bash
/// RUST_LOG=debug REDIS_ADDR=127.0.0.1:6379 cargo run
/// ```
#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    dockwatch::run().await
}
