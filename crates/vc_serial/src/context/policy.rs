use alloc::borrow::Cow;
use core::fmt;

use vc_os::sync::atomic::{AtomicU64, Ordering};
use vc_os::sync::{Arc, LazyLock};

use crate::info::{FieldInfo, FieldMarker};

// -----------------------------------------------------------------------------
// MemberFilter

/// Which unmarked struct members are serialized.
///
/// Members marked `#[serial(skip)]` are never serialized, members marked
/// `#[serial(serialize)]` always are.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum MemberFilter {
    /// Every member.
    All,
    /// Public members and members marked for serialization.
    #[default]
    PublicOrMarked,
}

// -----------------------------------------------------------------------------
// SerializationPolicy

static NEXT_POLICY_ID: AtomicU64 = AtomicU64::new(0);

/// A named bundle of rules governing which types may be serialized and how
/// mismatches are tolerated.
///
/// Policies are shared as `Arc<SerializationPolicy>` and compared by their
/// unique id, which is assigned when the policy is built. The formatter
/// cache is keyed by that id.
pub struct SerializationPolicy {
    id: u64,
    name: Cow<'static, str>,
    allow_non_serializable_types: bool,
    allow_deserialize_invalid_data: bool,
    member_filter: MemberFilter,
}

impl SerializationPolicy {
    /// Starts building a new policy.
    pub fn builder(name: impl Into<Cow<'static, str>>) -> PolicyBuilder {
        PolicyBuilder {
            name: name.into(),
            allow_non_serializable_types: false,
            allow_deserialize_invalid_data: false,
            member_filter: MemberFilter::default(),
        }
    }

    /// Rejects types not marked serializable and never guesses at invalid data.
    pub fn strict() -> Arc<Self> {
        static STRICT: LazyLock<Arc<SerializationPolicy>> =
            LazyLock::new(|| SerializationPolicy::builder("strict").build());
        STRICT.clone()
    }

    /// Serializes any type, but never guesses at invalid data.
    pub fn default_policy() -> Arc<Self> {
        static DEFAULT: LazyLock<Arc<SerializationPolicy>> = LazyLock::new(|| {
            SerializationPolicy::builder("default")
                .with_allow_non_serializable_types(true)
                .build()
        });
        DEFAULT.clone()
    }

    /// Serializes every member of every type and salvages mismatched data.
    pub fn everything() -> Arc<Self> {
        static EVERYTHING: LazyLock<Arc<SerializationPolicy>> = LazyLock::new(|| {
            SerializationPolicy::builder("everything")
                .with_allow_non_serializable_types(true)
                .with_allow_deserialize_invalid_data(true)
                .with_member_filter(MemberFilter::All)
                .build()
        });
        EVERYTHING.clone()
    }

    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn allow_non_serializable_types(&self) -> bool {
        self.allow_non_serializable_types
    }

    #[inline]
    pub fn allow_deserialize_invalid_data(&self) -> bool {
        self.allow_deserialize_invalid_data
    }

    #[inline]
    pub fn member_filter(&self) -> MemberFilter {
        self.member_filter
    }

    /// Returns `true` if `field` is serialized under this policy.
    pub fn should_serialize_field(&self, field: &FieldInfo) -> bool {
        match field.marker() {
            FieldMarker::Skip => false,
            FieldMarker::Serialize => true,
            FieldMarker::None => match self.member_filter {
                MemberFilter::All => true,
                MemberFilter::PublicOrMarked => field.is_public(),
            },
        }
    }
}

impl PartialEq for SerializationPolicy {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for SerializationPolicy {}

impl fmt::Debug for SerializationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerializationPolicy")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("allow_non_serializable_types", &self.allow_non_serializable_types)
            .field("allow_deserialize_invalid_data", &self.allow_deserialize_invalid_data)
            .field("member_filter", &self.member_filter)
            .finish()
    }
}

// -----------------------------------------------------------------------------
// PolicyBuilder

/// Builder returned by [`SerializationPolicy::builder`].
#[derive(Clone, Debug)]
pub struct PolicyBuilder {
    name: Cow<'static, str>,
    allow_non_serializable_types: bool,
    allow_deserialize_invalid_data: bool,
    member_filter: MemberFilter,
}

impl PolicyBuilder {
    pub fn with_allow_non_serializable_types(mut self, allow: bool) -> Self {
        self.allow_non_serializable_types = allow;
        self
    }

    pub fn with_allow_deserialize_invalid_data(mut self, allow: bool) -> Self {
        self.allow_deserialize_invalid_data = allow;
        self
    }

    pub fn with_member_filter(mut self, filter: MemberFilter) -> Self {
        self.member_filter = filter;
        self
    }

    /// Builds the policy and assigns it a fresh id.
    pub fn build(self) -> Arc<SerializationPolicy> {
        Arc::new(SerializationPolicy {
            id: NEXT_POLICY_ID.fetch_add(1, Ordering::Relaxed),
            name: self.name,
            allow_non_serializable_types: self.allow_non_serializable_types,
            allow_deserialize_invalid_data: self.allow_deserialize_invalid_data,
            member_filter: self.member_filter,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{MemberFilter, SerializationPolicy};
    use vc_os::sync::Arc;

    #[test]
    fn named_policies_are_singletons() {
        assert!(Arc::ptr_eq(&SerializationPolicy::strict(), &SerializationPolicy::strict()));
        assert_ne!(SerializationPolicy::strict(), SerializationPolicy::everything());
        assert_ne!(SerializationPolicy::default_policy(), SerializationPolicy::everything());
    }

    #[test]
    fn built_policies_are_distinct() {
        let a = SerializationPolicy::builder("custom").build();
        let b = SerializationPolicy::builder("custom").build();
        assert_ne!(a, b);
        assert_eq!(a.member_filter(), MemberFilter::PublicOrMarked);
        assert!(!a.allow_deserialize_invalid_data());
    }
}
