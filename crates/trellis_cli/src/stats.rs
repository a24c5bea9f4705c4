//! `trellis stats` — cache and graph snapshot.

use trellis_build::{render_text, system_report};

use crate::session::Session;
use crate::{GlobalArgs, StatsArgs};

/// Runs the `trellis stats` command.
///
/// Loads the session and prints the system report as text or JSON.
pub fn run(args: &StatsArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let session = Session::open(global)?;
    let report = system_report(&session.cache, &session.graph);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render_text(&report));
    }
    Ok(0)
}
