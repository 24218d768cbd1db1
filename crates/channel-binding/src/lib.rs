#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! crates/channel-binding/src/lib.rs
//!
//! # Overview
//!
//! `channel-binding` decides, at the moment of every emit call, which sink a
//! channel writes to. A [`Rebinder`] owns one [`BindingStack`] of immutable
//! [`Frame`]s per thread and a [`Console`] whose channel members are replaced
//! by interceptors while a frame binds them. An interceptor asks the emitting
//! thread's stack for the channel's sink, redirects that thread's view of the
//! process-visible slot for the duration of the call, delegates to the
//! original emit implementation and restores the slot afterwards.
//!
//! # Design
//!
//! - [`Rebinder::rebind`] and [`ScopeHandle::unbind`] are the unstructured
//!   push and pop. Pops are strict LIFO and report misuse instead of repairing
//!   the stack.
//! - [`Rebinder::with`], [`Rebinder::run`] and [`Rebinder::scope`] pop on
//!   every exit path, panics included, and discard frames leaked by the work
//!   they wrap.
//! - [`Binding::encapsulate`] wraps an [`Api`] so each method call runs inside
//!   the binding; [`Encapsulated`] does the same for typed values.
//! - [`Rebinder::lock`] hands out the single [`UnlockToken`] allowed per
//!   rebinder.
//!
//! # Invariants
//!
//! - The bottom frame is never popped.
//! - Frames and slot redirects are per thread: nothing one thread pushes or
//!   redirects changes where another thread's emits land.
//! - Every frame already contains the bindings it inherited, so resolution
//!   reads only the top frame and never caches it across calls.
//! - An interceptor always delegates to the true original implementation,
//!   never to another interceptor.
//! - Failed operations leave the stack, the console and the lock untouched.
//!
//! # Observability
//!
//! With the `tracing` feature enabled, frame, interceptor and lock
//! transitions are reported as `tracing` events under the [`TRACE_TARGET`]
//! target.
//!
//! # Examples
//!
//! ```
//! use channel_binding::{BindingError, Rebinder};
//! use channel_sink::{MemorySink, Preset, StreamRegistry};
//!
//! let out = MemorySink::new("out");
//! let err = MemorySink::new("err");
//! let rebinder = Rebinder::new(StreamRegistry::new(out.sink(), err.sink()));
//!
//! let handle = rebinder.rebind(Preset::Diagnostics)?;
//! rebinder.log("diagnostic").ok();
//! handle.unbind()?;
//! rebinder.log("data").ok();
//!
//! assert_eq!(err.lines(), ["diagnostic"]);
//! assert_eq!(out.lines(), ["data"]);
//! assert!(matches!(handle.unbind(), Err(BindingError::StackDiscipline { .. })));
//! # Ok::<(), BindingError>(())
//! ```

mod console;
mod encapsulate;
mod error;
mod frame;
mod lock;
mod scope;
mod stack;
mod trace;

pub use crate::console::{
    Console, ConsoleMember, EmitFn, Emitter, FrameProvider, ProcessStreams, Redirect,
};
pub use crate::encapsulate::{Api, ApiBuilder, Encapsulated, Member, Method, MethodFn, Return};
pub use crate::error::{BindingError, CallError, ConfigurationError, EmitError, MethodError};
pub use crate::frame::{Frame, FrameHandle, FrameId};
pub use crate::lock::UnlockToken;
pub use crate::scope::{Binding, BindingSpec, Rebinder, ScopeGuard, ScopeHandle};
pub use crate::stack::BindingStack;
pub use crate::trace::TARGET as TRACE_TARGET;
