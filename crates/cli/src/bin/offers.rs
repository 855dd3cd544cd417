use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    offer_cli::main_entry().await
}
