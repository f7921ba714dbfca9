//! # Subject keys: which topic a handler listens on.
//!
//! A subject is the pair *(payload type, scope)*:
//! - the payload type is the [`TypeId`] of the published message;
//! - the scope is either a [`ScopeId`] or "no scope" (global).
//!
//! "No scope" is expressed as `None` at the type level, so it can never collide
//! with a caller-supplied scope id.
//!
//! ## Example
//! ```rust
//! use subjectbus::{ScopeId, SubjectKey};
//!
//! struct Score;
//!
//! let global = SubjectKey::of::<Score>(None);
//! let scoped = SubjectKey::of::<Score>(Some(ScopeId::from("player1")));
//!
//! assert_ne!(global, scoped);
//! assert_eq!(scoped, SubjectKey::of::<Score>(Some("player1".into())));
//! assert_eq!(global.to_global(), global);
//! assert_eq!(scoped.to_global(), global);
//! ```

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Opaque identifier narrowing delivery to a specific target.
///
/// Strings and unsigned integers convert directly; any other
/// `Hash + Eq + Send + Sync + 'static` value goes through [`ScopeId::key`].
/// Two ids are equal only if they are the same variant with the same value:
/// `"7"`, `7` and `ScopeId::key(Entity(7))` are three different scopes.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ScopeId {
    /// Named scope, e.g. an entity or player name.
    Name(Arc<str>),
    /// Numeric scope, e.g. an entity handle.
    Num(u64),
    /// Caller-defined key type (uuid, tuple, newtype handle, enum...).
    Key(ScopeKey),
}

impl ScopeId {
    /// Wraps an arbitrary caller key.
    ///
    /// ## Example
    /// ```rust
    /// use subjectbus::ScopeId;
    ///
    /// #[derive(Hash, PartialEq, Eq)]
    /// struct Entity(u32);
    ///
    /// assert_eq!(ScopeId::key(Entity(3)), ScopeId::key(Entity(3)));
    /// assert_ne!(ScopeId::key(Entity(3)), ScopeId::from(3u64));
    /// ```
    pub fn key<K>(key: K) -> Self
    where
        K: Hash + Eq + Send + Sync + 'static,
    {
        ScopeId::Key(ScopeKey::new(key))
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScopeId::Name(name) => f.write_str(name),
            ScopeId::Num(n) => write!(f, "#{n}"),
            ScopeId::Key(key) => write!(f, "<{}>", key.type_name()),
        }
    }
}

/// Object-safe view of a caller key.
trait DynKey: Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn dyn_eq(&self, other: &dyn DynKey) -> bool;
    fn dyn_hash(&self, state: &mut dyn Hasher);
    fn type_name(&self) -> &'static str;
}

impl<K> DynKey for K
where
    K: Hash + Eq + Send + Sync + 'static,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn dyn_eq(&self, other: &dyn DynKey) -> bool {
        other
            .as_any()
            .downcast_ref::<K>()
            .is_some_and(|other| other == self)
    }

    fn dyn_hash(&self, mut state: &mut dyn Hasher) {
        // equal values of different key types hash apart
        TypeId::of::<K>().hash(&mut state);
        self.hash(&mut state);
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<K>()
    }
}

/// Type-erased caller key held by [`ScopeId::Key`].
///
/// Equal only to a key of the same type with an equal value.
#[derive(Clone)]
pub struct ScopeKey(Arc<dyn DynKey>);

impl ScopeKey {
    /// Erases `key`.
    pub fn new<K>(key: K) -> Self
    where
        K: Hash + Eq + Send + Sync + 'static,
    {
        ScopeKey(Arc::new(key))
    }

    /// Returns the key if it is a `K`.
    pub fn downcast_ref<K: 'static>(&self) -> Option<&K> {
        self.0.as_any().downcast_ref::<K>()
    }

    /// Returns the name of the key's type.
    pub fn type_name(&self) -> &'static str {
        self.0.type_name()
    }
}

impl PartialEq for ScopeKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.dyn_eq(&*other.0)
    }
}

impl Eq for ScopeKey {}

impl Hash for ScopeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.dyn_hash(state);
    }
}

impl fmt::Debug for ScopeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ScopeKey").field(&self.type_name()).finish()
    }
}

impl From<&str> for ScopeId {
    fn from(value: &str) -> Self {
        ScopeId::Name(Arc::from(value))
    }
}

impl From<String> for ScopeId {
    fn from(value: String) -> Self {
        ScopeId::Name(Arc::from(value))
    }
}

impl From<Arc<str>> for ScopeId {
    fn from(value: Arc<str>) -> Self {
        ScopeId::Name(value)
    }
}

impl From<u64> for ScopeId {
    fn from(value: u64) -> Self {
        ScopeId::Num(value)
    }
}

impl From<u32> for ScopeId {
    fn from(value: u32) -> Self {
        ScopeId::Num(u64::from(value))
    }
}

impl From<usize> for ScopeId {
    fn from(value: usize) -> Self {
        ScopeId::Num(value as u64)
    }
}

/// Dispatch topic: payload type plus optional scope.
///
/// Equality and hashing use the [`TypeId`] and the scope only; the type name is
/// kept for logs and error messages.
#[derive(Clone)]
pub struct SubjectKey {
    type_id: TypeId,
    type_name: &'static str,
    scope: Option<ScopeId>,
}

impl SubjectKey {
    /// Builds the subject for payload type `M` under `scope` (`None` = global).
    pub fn of<M: 'static>(scope: Option<ScopeId>) -> Self {
        Self {
            type_id: TypeId::of::<M>(),
            type_name: std::any::type_name::<M>(),
            scope,
        }
    }

    /// Returns the payload type id.
    #[inline]
    pub fn payload_type(&self) -> TypeId {
        self.type_id
    }

    /// Returns the payload type name (diagnostics only).
    #[inline]
    pub fn payload_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns the scope, `None` for global subjects.
    #[inline]
    pub fn scope(&self) -> Option<&ScopeId> {
        self.scope.as_ref()
    }

    /// Returns `true` if this subject has no scope.
    #[inline]
    pub fn is_global(&self) -> bool {
        self.scope.is_none()
    }

    /// Returns the global subject of the same payload type.
    pub fn to_global(&self) -> Self {
        Self {
            type_id: self.type_id,
            type_name: self.type_name,
            scope: None,
        }
    }
}

impl PartialEq for SubjectKey {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id && self.scope == other.scope
    }
}

impl Eq for SubjectKey {}

impl Hash for SubjectKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
        self.scope.hash(state);
    }
}

impl fmt::Display for SubjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.scope {
            Some(scope) => write!(f, "{}@{}", self.type_name, scope),
            None => f.write_str(self.type_name),
        }
    }
}

impl fmt::Debug for SubjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubjectKey")
            .field("type", &self.type_name)
            .field("scope", &self.scope)
            .finish()
    }
}
