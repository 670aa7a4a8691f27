#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = hostel_complaints::run().await {
        eprintln!("hostel-complaints fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
