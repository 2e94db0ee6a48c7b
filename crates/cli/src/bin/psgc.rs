use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    psgc_cli::main_entry().await
}
