//! mpki - managed-PKI gateway operator CLI

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    mpki_cli::run().await
}
