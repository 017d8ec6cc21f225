#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    club_events_console::run().await
}
