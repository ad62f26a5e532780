use tracing::error;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let _ = tracing_subscriber::fmt().with_env_filter("info").try_init();

    if let Err(err) = tdr_toolkit::interfaces::cli::run().await {
        error!(error = %err, "Fatal error");
        std::process::exit(1);
    }
}
