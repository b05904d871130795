#[tokio::main]
async fn main() {
    sexton::start_server().await;
}
