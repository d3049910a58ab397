//! `skyarc place`: where the sky is being observed from.

use anyhow::Result;

use super::{Session, print_json};

pub fn handle_place_command(session: &Session) -> Result<()> {
    let observer = session.engine.observer();

    if session.json {
        return print_json(observer);
    }

    let now = session.now().with_timezone(&observer.tz);
    log_block_start!("{}", observer.label);
    log_indented!("coordinates  {}", observer.coords);
    log_indented!("timezone     {} (UTC{})", observer.tz.name(), now.format("%:z"));
    log_indented!("local time   {}", now.format("%Y-%m-%d %H:%M:%S"));
    let sources: Vec<&str> = session.engine.sources().iter().map(|s| s.as_str()).collect();
    log_indented!("sources      {}", sources.join(", "));
    log_end!();
    Ok(())
}
