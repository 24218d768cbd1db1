//! crates/channel-binding/src/encapsulate/mod.rs
//!
//! Capability wrapping: objects whose every method runs inside a binding.
//!
//! [`Api`] is the dynamic form, a named set of methods and properties that can
//! be wrapped member by member. [`Encapsulated`] is the typed form for plain
//! Rust values, where the "methods" are closures run against the value.

mod api;
mod typed;

use std::sync::Weak;

use crate::error::MethodError;
use crate::scope::Binding;

pub use self::api::{Api, ApiBuilder, Member, Method, MethodFn, Return};
pub use self::typed::Encapsulated;

use self::api::ApiInner;

/// Builds the wrapper for `api` under `binding`.
pub(crate) fn wrap(api: &Api, binding: &Binding) -> Api {
    Api::cyclic(|wrapper| {
        api.members()
            .map(|(name, member)| {
                let wrapped = match member {
                    Member::Property(value) => Member::Property(value.clone()),
                    Member::Method(method) => {
                        Member::Method(wrap_method(api, method, wrapper, binding))
                    }
                };
                (name.to_owned(), wrapped)
            })
            .collect()
    })
}

fn wrap_method(original: &Api, method: &Method, wrapper: &Weak<ApiInner>, binding: &Binding) -> Method {
    let original = original.clone();
    let method = method.clone();
    let wrapper = wrapper.clone();
    let binding = binding.clone();
    Method::new(move |receiver, args| {
        let wrapper = Api::upgrade(&wrapper);
        // Calls made on the wrapper itself target the original so the
        // original's own method lookups never re-enter the wrapper.
        let target = match &wrapper {
            Some(wrapper) if wrapper.same(receiver) => &original,
            _ => receiver,
        };
        binding.with(|| -> Result<Return, MethodError> {
            match method.call(target, args)? {
                Return::Api(returned) if returned.same(&original) => {
                    Ok(Return::Api(wrapper.clone().unwrap_or(returned)))
                }
                other => Ok(other),
            }
        })
    })
}
