//! Walks through the process-wide API on the real standard streams.
//!
//! Run with `cargo run --example walkthrough 2>/dev/null` to see only the
//! lines that stay on standard output.

use stdio_rebind::{Api, DATA, DIAGNOSTICS, Return};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    stdio_rebind::log("by default, log() writes to stdout")?;
    stdio_rebind::info("info() does too")?;

    let handle = stdio_rebind::rebind(DIAGNOSTICS)?;
    stdio_rebind::log("after rebind(DIAGNOSTICS), log() writes to stderr")?;
    stdio_rebind::info("and info() does too")?;
    handle.unbind()?;
    stdio_rebind::log("unbind() undoes the rebind for log()")?;
    stdio_rebind::info("and for info()")?;

    stdio_rebind::run(DIAGNOSTICS, || -> Result<(), stdio_rebind::EmitError> {
        stdio_rebind::log("run() rebinds log() for the duration of a closure")?;
        stdio_rebind::info("and info() too")
    })??;
    stdio_rebind::log("after run(), log() writes to stdout again")?;

    let api = Api::builder()
        .method("foo", |_, _| {
            stdio_rebind::log("api.foo expects log() to write to stdout, so it does")?;
            Ok(Return::unit())
        })
        .build();

    let handle = stdio_rebind::rebind(DIAGNOSTICS)?;
    stdio_rebind::encapsulate(&api, DATA)?.call("foo", &[])?;
    handle.unbind()?;

    stdio_rebind::warn("warn() and error() always write to stderr")?;
    Ok(())
}
