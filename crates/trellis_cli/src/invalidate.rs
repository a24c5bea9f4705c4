//! `trellis invalidate` and `trellis clear` — cache invalidation.

use trellis_invalidate::{InvalidationStrategy, Invalidator};

use crate::session::Session;
use crate::{GlobalArgs, InvalidateArgs};

/// Runs the `trellis invalidate` command.
///
/// Applies the chosen strategy to the target and prints what was
/// invalidated. Signature updates are persisted back to the graph
/// manifest. Returns exit code 0 even when the target matched nothing;
/// the warning is informational.
pub fn run(args: &InvalidateArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let strategy: InvalidationStrategy = args.strategy.parse()?;

    let mut session = Session::open(global)?;
    let report = Invalidator::new(&session.cache, &mut session.graph)
        .apply(strategy, &args.target)?;
    session.save_graph()?;

    if !global.quiet {
        for warning in &report.warnings {
            eprintln!("warning: {warning}");
        }
        if report.cleared_all {
            eprintln!("cache cleared");
        } else {
            eprintln!(
                "invalidated {} entr{}",
                report.invalidated.len(),
                if report.invalidated.len() == 1 { "y" } else { "ies" }
            );
        }
        if global.verbose {
            for key in &report.invalidated {
                eprintln!("  {key}");
            }
        }
    }
    Ok(0)
}

/// Runs the `trellis clear` command: global invalidation.
pub fn run_clear(global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let mut session = Session::open(global)?;
    let report = Invalidator::new(&session.cache, &mut session.graph)
        .apply(InvalidationStrategy::Global, ":all")?;

    if !global.quiet && report.cleared_all {
        eprintln!("cache cleared");
    }
    Ok(0)
}
