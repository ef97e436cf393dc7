use cadence_server::core::App;

#[tokio::main]
async fn main() {
    if let Err(e) = App::run().await {
        eprintln!("\nError: {e:#}\n");
        std::process::exit(1);
    }
}
