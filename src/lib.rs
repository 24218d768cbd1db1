#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! src/lib.rs
//!
//! # Overview
//!
//! `stdio-rebind` redirects the `log`, `info`, `warn` and `error` output
//! channels between standard output and standard error for the duration of a
//! scope, without touching the code that emits. Call sites emit by channel;
//! the binding on top of the stack decides which stream receives the bytes.
//!
//! The crate re-exports the two workspace members and owns the process-wide
//! [`Rebinder`] over the real standard streams, returned by [`global`]. The
//! free functions in this module operate on that instance. Libraries and tests
//! that want isolation construct their own [`Rebinder`] instead.
//!
//! # Configuration
//!
//! The process-wide instance reads [`CONSOLE_ENV_VAR`] on first use. Setting
//! it to `stderr` routes the data channels to standard error by default; an
//! unrecognised value is ignored in favour of the default routing. Use
//! [`Rebinder::new`] with [`StreamRegistry::with_config`] to surface the error
//! instead.
//!
//! # Examples
//!
//! ```no_run
//! use stdio_rebind::DIAGNOSTICS;
//!
//! stdio_rebind::log("results go to stdout")?;
//! stdio_rebind::run(DIAGNOSTICS, || {
//!     stdio_rebind::log("chatter from a dependency goes to stderr").ok();
//! })?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::sync::OnceLock;

pub use channel_binding::{
    Api, ApiBuilder, Binding, BindingError, BindingSpec, BindingStack, CallError,
    ConfigurationError, Console, ConsoleMember, EmitError, EmitFn, Emitter, Encapsulated, Frame,
    FrameHandle, FrameId, FrameProvider, Member, Method, MethodError, MethodFn, ProcessStreams,
    Rebinder, Redirect, Return, ScopeGuard, ScopeHandle, TRACE_TARGET, UnlockToken,
};
pub use channel_sink::{
    CONSOLE_ENV_VAR, Channel, DATA_CHANNELS, LineMode, Overrides, Preset, PresetParseError,
    RoutingConfig, RoutingConfigError, Sink, SinkId, SinkSlot, SinkSlotParseError,
    StreamRegistry,
};

/// Routes the data channels to standard output.
pub const DATA: Preset = Preset::Data;

/// Routes the data channels to standard error.
pub const DIAGNOSTICS: Preset = Preset::Diagnostics;

/// Returns the process-wide rebinder over the real standard streams.
///
/// The instance is shared by every thread, but each thread pushes onto and
/// resolves through its own binding stack; see [`Rebinder`].
pub fn global() -> &'static Rebinder {
    static GLOBAL: OnceLock<Rebinder> = OnceLock::new();
    GLOBAL.get_or_init(|| {
        let config = RoutingConfig::from_env().unwrap_or_default();
        Rebinder::new(StreamRegistry::process_with_config(&config))
    })
}

/// Pushes `spec` on the calling thread's process-wide stack; see [`Rebinder::rebind`].
pub fn rebind(spec: impl Into<BindingSpec>) -> Result<ScopeHandle, BindingError> {
    global().rebind(spec)
}

/// Pushes `spec` until the returned guard drops; see [`Rebinder::scope`].
pub fn scope(spec: impl Into<BindingSpec>) -> Result<ScopeGuard, BindingError> {
    global().scope(spec)
}

/// Runs `work` inside `spec`; see [`Rebinder::with`].
pub fn with<R, E, F>(spec: impl Into<BindingSpec>, work: F) -> Result<R, E>
where
    F: FnOnce() -> Result<R, E>,
    E: From<BindingError>,
{
    global().with(spec, work)
}

/// Runs infallible `work` inside `spec`; see [`Rebinder::run`].
pub fn run<R, F>(spec: impl Into<BindingSpec>, work: F) -> Result<R, BindingError>
where
    F: FnOnce() -> R,
{
    global().run(spec, work)
}

/// Returns a reusable binding on the process-wide rebinder.
pub fn binding(spec: impl Into<BindingSpec>) -> Result<Binding, BindingError> {
    global().binding(spec)
}

/// Wraps `api` so its methods run inside `spec`; see [`Binding::encapsulate`].
pub fn encapsulate(api: &Api, spec: impl Into<BindingSpec>) -> Result<Api, BindingError> {
    global().encapsulate(api, spec)
}

/// Takes the process-wide lock; see [`Rebinder::lock`].
pub fn lock(spec: impl Into<BindingSpec>) -> Result<UnlockToken, BindingError> {
    global().lock(spec)
}

/// Returns a console copy permanently bound to `spec`.
///
/// The copy ignores every binding stack but writes through the same
/// process streams.
pub fn detached(spec: impl Into<BindingSpec>) -> Result<Console, BindingError> {
    let rebinder = global();
    let overrides = rebinder.overrides_for(spec)?;
    Ok(rebinder.console().detached(&overrides)?)
}

/// Emits `bytes` on `channel` through the process-wide console.
pub fn emit(channel: &Channel, bytes: &[u8]) -> Result<(), EmitError> {
    global().emit(channel, bytes)
}

/// Emits `message` on [`Channel::LOG`].
pub fn log(message: impl AsRef<[u8]>) -> Result<(), EmitError> {
    global().log(message)
}

/// Emits `message` on [`Channel::INFO`].
pub fn info(message: impl AsRef<[u8]>) -> Result<(), EmitError> {
    global().info(message)
}

/// Emits `message` on [`Channel::WARN`].
pub fn warn(message: impl AsRef<[u8]>) -> Result<(), EmitError> {
    global().warn(message)
}

/// Emits `message` on [`Channel::ERROR`].
pub fn error(message: impl AsRef<[u8]>) -> Result<(), EmitError> {
    global().error(message)
}
