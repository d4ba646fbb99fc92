//! Structured logging for the `--trace` CLI flag (spec §1's "diagnostic
//! tracing to a log stream" collaborator). Grounded on `navicore-cem3`'s
//! `tracing`/`tracing-subscriber` workspace dependency pair — the teacher
//! crate carries no logging dependency at all, so this is enrichment from
//! the rest of the example pack rather than a port.

use tracing_subscriber::EnvFilter;

/// Installs a `tracing` subscriber writing to stderr. `verbose` lowers the
/// default level from `info` to `debug` (used by `--trace`); `RUST_LOG`
/// still takes precedence when set, matching `tracing-subscriber`'s usual
/// convention.
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Logs one executed instruction at `debug` level — called from the VM's
/// exec loop only when tracing is enabled, since formatting every
/// instruction has a real cost on hot loops.
pub fn trace_instruction(pc: usize, instruction: &crate::instruction::Instruction) {
    tracing::debug!(pc, %instruction, "executing instruction");
}
