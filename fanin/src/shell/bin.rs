// Binary entry point for fanin
// This is a thin wrapper that delegates to the library implementation

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(e) = fanin::shell::run().await {
        eprintln!("fanin fatal error: {:#}", e);
        return Err(e);
    }
    Ok(())
}
