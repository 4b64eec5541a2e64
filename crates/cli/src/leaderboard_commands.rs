use {
    anyhow::Result,
    helpdesk_config::HelpdeskConfig,
    helpdesk_tickets::{FileStore, TicketStore, leaderboard},
};

/// Render the leaderboard from disk without connecting to Discord.
pub async fn print(config: &HelpdeskConfig, limit: usize) -> Result<()> {
    let store = FileStore::new(&config.storage.data_dir);
    let snapshot = store.load().await;

    let ranked = leaderboard::top_staff(&snapshot.staff_load, limit);
    println!("Top {limit} most active ticket staff");
    println!("{}", leaderboard::render(&ranked, str::to_owned));
    println!();
    println!(
        "{} open ticket(s) in {}",
        snapshot.assignments.len(),
        store.dir().display()
    );
    Ok(())
}
