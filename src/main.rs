use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    turing_arena::cli::run().await
}
