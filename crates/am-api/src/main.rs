#[tokio::main]
async fn main() {
    if let Err(err) = am_api::run().await {
        tracing::error!(error = %err, "am-api failed");
        std::process::exit(1);
    }
}
