use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Weak};

use serde_json::Value;

use crate::error::{CallError, MethodError};

/// Signature of a capability method.
///
/// The first argument is the receiver the method was invoked on, which may be
/// an object derived from the one that defines the method.
pub type MethodFn = dyn Fn(&Api, &[Value]) -> Result<Return, MethodError> + Send + Sync;

/// Callable member of an [`Api`].
#[derive(Clone)]
pub struct Method(Arc<MethodFn>);

impl Method {
    /// Wraps `func` as a method.
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(&Api, &[Value]) -> Result<Return, MethodError> + Send + Sync + 'static,
    {
        Self(Arc::new(func))
    }

    /// Invokes the method against `receiver`.
    pub fn call(&self, receiver: &Api, args: &[Value]) -> Result<Return, MethodError> {
        (self.0)(receiver, args)
    }

    /// Reports whether `self` and `other` are the same method.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.0), Arc::as_ptr(&other.0))
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Method")
            .field(&Arc::as_ptr(&self.0).cast::<()>())
            .finish()
    }
}

/// Member of an [`Api`].
#[derive(Clone, Debug)]
pub enum Member {
    /// Callable member.
    Method(Method),
    /// Plain value.
    Property(Value),
}

impl Member {
    /// Reports whether the member can be called.
    #[must_use]
    pub const fn is_callable(&self) -> bool {
        matches!(self, Self::Method(_))
    }
}

/// Result of a method call.
#[derive(Clone, Debug)]
pub enum Return {
    /// Plain value.
    Value(Value),
    /// Capability object, typically the receiver for fluent chaining.
    Api(Api),
}

impl Return {
    /// Returns the unit result.
    #[must_use]
    pub const fn unit() -> Self {
        Self::Value(Value::Null)
    }

    /// Returns the plain value, if any.
    #[must_use]
    pub const fn value(&self) -> Option<&Value> {
        match self {
            Self::Value(value) => Some(value),
            Self::Api(_) => None,
        }
    }

    /// Returns the capability object, if any.
    #[must_use]
    pub const fn api(&self) -> Option<&Api> {
        match self {
            Self::Api(api) => Some(api),
            Self::Value(_) => None,
        }
    }
}

impl From<Value> for Return {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<Api> for Return {
    fn from(api: Api) -> Self {
        Self::Api(api)
    }
}

/// Object exposing named methods and properties.
///
/// `Api` values are immutable and cheap to clone; clones are the same object
/// as far as [`same`](Self::same) is concerned.
///
/// ```
/// use channel_binding::{Api, Return};
/// use serde_json::json;
///
/// let counter = Api::builder()
///     .property("name", json!("counter"))
///     .method("double", |_, args| {
///         let n = args.first().and_then(|v| v.as_i64()).unwrap_or_default();
///         Ok(Return::Value(json!(n * 2)))
///     })
///     .build();
///
/// let result = counter.call("double", &[json!(21)])?;
/// assert_eq!(result.value(), Some(&json!(42)));
/// # Ok::<(), channel_binding::CallError>(())
/// ```
#[derive(Clone)]
pub struct Api {
    inner: Arc<ApiInner>,
}

pub(crate) struct ApiInner {
    members: BTreeMap<String, Member>,
}

impl Api {
    /// Starts an empty object.
    #[must_use]
    pub fn builder() -> ApiBuilder {
        ApiBuilder::default()
    }

    /// Starts a derived object holding a copy of every member of `self`.
    ///
    /// Inherited methods receive the derived object as their receiver.
    #[must_use]
    pub fn extend(&self) -> ApiBuilder {
        ApiBuilder {
            members: self.inner.members.clone(),
        }
    }

    pub(crate) fn cyclic<F>(build: F) -> Self
    where
        F: FnOnce(&Weak<ApiInner>) -> BTreeMap<String, Member>,
    {
        Self {
            inner: Arc::new_cyclic(|weak| ApiInner {
                members: build(weak),
            }),
        }
    }

    pub(crate) fn upgrade(weak: &Weak<ApiInner>) -> Option<Self> {
        weak.upgrade().map(|inner| Self { inner })
    }

    /// Returns the member named `name`.
    #[must_use]
    pub fn member(&self, name: &str) -> Option<&Member> {
        self.inner.members.get(name)
    }

    /// Returns every member in name order.
    pub fn members(&self) -> impl Iterator<Item = (&str, &Member)> + '_ {
        self.inner
            .members
            .iter()
            .map(|(name, member)| (name.as_str(), member))
    }

    /// Returns the names of the callable members.
    pub fn method_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.members()
            .filter(|(_, member)| member.is_callable())
            .map(|(name, _)| name)
    }

    /// Returns the property named `name`.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&Value> {
        match self.member(name) {
            Some(Member::Property(value)) => Some(value),
            _ => None,
        }
    }

    /// Calls the method `name` with `self` as receiver.
    pub fn call(&self, name: &str, args: &[Value]) -> Result<Return, CallError> {
        self.call_with_receiver(self, name, args)
    }

    /// Calls this object's method `name` with an explicit receiver.
    pub fn call_with_receiver(
        &self,
        receiver: &Self,
        name: &str,
        args: &[Value],
    ) -> Result<Return, CallError> {
        match self.member(name) {
            Some(Member::Method(method)) => method.call(receiver, args).map_err(CallError::Method),
            Some(Member::Property(_)) => Err(CallError::NotCallable(name.to_owned())),
            None => Err(CallError::UnknownMember(name.to_owned())),
        }
    }

    /// Reports whether `self` and `other` are the same object.
    #[must_use]
    pub fn same(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Api {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Api")
            .field("members", &self.inner.members.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Builder for [`Api`] objects.
#[derive(Clone, Debug, Default)]
pub struct ApiBuilder {
    members: BTreeMap<String, Member>,
}

impl ApiBuilder {
    /// Adds or replaces a method.
    #[must_use]
    pub fn method<F>(mut self, name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&Api, &[Value]) -> Result<Return, MethodError> + Send + Sync + 'static,
    {
        self.members
            .insert(name.into(), Member::Method(Method::new(func)));
        self
    }

    /// Adds or replaces a property.
    #[must_use]
    pub fn property(mut self, name: impl Into<String>, value: Value) -> Self {
        self.members.insert(name.into(), Member::Property(value));
        self
    }

    /// Adds or replaces a member.
    #[must_use]
    pub fn member(mut self, name: impl Into<String>, member: Member) -> Self {
        self.members.insert(name.into(), member);
        self
    }

    /// Finishes the object.
    #[must_use]
    pub fn build(self) -> Api {
        Api {
            inner: Arc::new(ApiInner {
                members: self.members,
            }),
        }
    }
}
