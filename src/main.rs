#[tokio::main]
async fn main() {
    if let Err(e) = ayurix_server::run().await {
        eprintln!("Fatal: {e}");
        std::process::exit(1);
    }
}
