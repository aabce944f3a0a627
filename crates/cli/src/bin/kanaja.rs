use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    kanaja_cli::main_entry().await
}
