//! Hosting Server Binary
//!
//! Serves room creation and WebSocket gameplay.
//! Runs on BIND_ADDR (default 0.0.0.0:5000).

#[tokio::main]
async fn main() {
    fp_core::log();
    fp_server::run().await.unwrap();
}
