//! Typed callbacks behind a type-erased dispatch record.
//!
//! Subscriptions with arbitrary payload types live in one table, so each
//! callback is stored as an [`ErasedHandler`] trait object: a dispatch
//! record carrying the `TypeId` of the payload it was subscribed with and a
//! thunk that re-checks that tag at call time. Publish wraps its argument
//! tuple in a [`SharedPayload`] with the matching tag; every task emitted by
//! one publish clones the same shared tuple, which is freed when the last of
//! those tasks completes.
//!
//! A tag mismatch is not an error at the publish site. The task reports it
//! from inside the worker, where it is logged and dropped; it never faults
//! the worker. One deliberate exception: a callback subscribed with the unit
//! payload `()` is the zero-argument fallback form and accepts any publish.

use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Marker bound for values that can ride a publish.
///
/// Implemented for every `Send + Sync + Clone + 'static` type; multi-argument
/// events use tuples (`(i32, String)` and so on). Handlers receive a clone of
/// the published value.
pub trait Payload: Send + Sync + Clone + 'static {}

impl<T: Send + Sync + Clone + 'static> Payload for T {}

/// Identifier of one subscription within a bus instance.
///
/// Unique, strictly monotonically increasing, and stable for the lifetime of
/// the subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    pub(crate) const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw numeric id.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The reference-counted argument tuple of one publish.
#[derive(Clone)]
pub(crate) struct SharedPayload {
    value: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl SharedPayload {
    pub(crate) fn new<P: Payload>(payload: P) -> Self {
        Self {
            value: Arc::new(payload),
            type_name: type_name::<P>(),
        }
    }

    fn downcast_ref<P: Payload>(&self) -> Option<&P> {
        self.value.downcast_ref::<P>()
    }
}

/// Diagnostic for a payload/signature disagreement, reported from inside the
/// worker and never raised to the publisher.
pub(crate) struct SignatureMismatch {
    /// Type the callback was subscribed with.
    pub(crate) expected: &'static str,
    /// Type the publish actually carried.
    pub(crate) got: &'static str,
}

/// Object-safe dispatch record over a typed callback.
pub(crate) trait ErasedHandler: Send + Sync {
    /// Tag of the payload type fixed at subscribe time.
    fn expected_type(&self) -> TypeId;

    /// Invokes the callback if the payload matches its signature, or through
    /// the zero-argument fallback.
    fn invoke(&self, payload: &SharedPayload) -> Result<(), SignatureMismatch>;
}

/// The concrete dispatch record for a callback over payload type `P`.
pub(crate) struct TypedHandler<P, F> {
    callback: F,
    _payload: PhantomData<fn(P)>,
}

impl<P, F> TypedHandler<P, F>
where
    P: Payload,
    F: Fn(P) + Send + Sync + 'static,
{
    pub(crate) fn new(callback: F) -> Self {
        Self {
            callback,
            _payload: PhantomData,
        }
    }
}

impl<P, F> ErasedHandler for TypedHandler<P, F>
where
    P: Payload,
    F: Fn(P) + Send + Sync + 'static,
{
    fn expected_type(&self) -> TypeId {
        TypeId::of::<P>()
    }

    fn invoke(&self, payload: &SharedPayload) -> Result<(), SignatureMismatch> {
        if let Some(typed) = payload.downcast_ref::<P>() {
            (self.callback)(typed.clone());
            return Ok(());
        }
        // Zero-argument fallback: `P == ()` accepts any payload.
        if let Some(unit) = (&() as &dyn Any).downcast_ref::<P>() {
            (self.callback)(unit.clone());
            return Ok(());
        }
        Err(SignatureMismatch {
            expected: type_name::<P>(),
            got: payload.type_name,
        })
    }
}
