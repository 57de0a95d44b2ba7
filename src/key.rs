use std::borrow::Cow;
use std::fmt;

/// Logical name of a mapped entity type.
///
/// The mapping layer assigns every persistent type a stable name (usually
/// the collection name it is stored under). `EntityType` is the cheap,
/// clonable token this crate uses wherever that name travels: inside
/// [`Key`](crate::Key), on deferred references as the declared referent
/// type, and in error messages.
///
/// Most call sites use static strings, so the name is held as a
/// `Cow<'static, str>` and `from_static` is `const`.
///
/// # Examples
///
/// ```
/// use perezoso::EntityType;
///
/// const USER: EntityType = EntityType::from_static("user");
///
/// let dynamic = EntityType::new(format!("tenant_{}", 42));
/// assert_eq!(USER.name(), "user");
/// assert_eq!(dynamic.name(), "tenant_42");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityType(Cow<'static, str>);

impl EntityType {
    /// Creates an entity type from a static name without allocating.
    pub const fn from_static(name: &'static str) -> Self {
        EntityType(Cow::Borrowed(name))
    }

    /// Creates an entity type from an owned or borrowed name.
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        EntityType(name.into())
    }

    /// Returns the logical type name.
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl From<&'static str> for EntityType {
    fn from(name: &'static str) -> Self {
        EntityType::from_static(name)
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Storage identifier of a persisted entity.
///
/// The mapping layer produces identifiers in one of two shapes: numeric
/// (auto-allocated sequences) or string (natural keys, UUIDs rendered as
/// text). Both hash and compare by value.
///
/// # Examples
///
/// ```
/// use perezoso::Id;
///
/// let a: Id = 7.into();
/// let b: Id = "7".into();
///
/// // Numeric and string identifiers never compare equal.
/// assert_ne!(a, b);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Id {
    Int(i64),
    Str(String),
}

impl From<i64> for Id {
    fn from(id: i64) -> Self {
        Id::Int(id)
    }
}

impl From<&str> for Id {
    fn from(id: &str) -> Self {
        Id::Str(id.to_owned())
    }
}

impl From<String> for Id {
    fn from(id: String) -> Self {
        Id::Str(id)
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Id::Int(id) => write!(f, "{}", id),
            Id::Str(id) => f.write_str(id),
        }
    }
}

/// Opaque lookup token pairing a logical entity type with its storage
/// identifier.
///
/// A `Key` is the hash key of the [`EntityCache`](crate::EntityCache) and
/// the persisted pointer inside deferred references. It never owns the
/// entity it names, and it is never mutated after construction; updating a
/// reference's manifest always replaces whole keys.
///
/// Equality and hashing cover both components, so the same identifier under
/// two entity types yields two distinct keys.
///
/// # Examples
///
/// ```
/// use perezoso::{EntityType, Key};
///
/// let user = Key::new(EntityType::from_static("user"), 7);
/// let order = Key::new(EntityType::from_static("order"), 7);
///
/// assert_ne!(user, order);
/// assert_eq!(user.to_string(), "user(7)");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Key {
    entity_type: EntityType,
    id: Id,
}

impl Key {
    /// Creates a key for the given entity type and identifier.
    pub fn new(entity_type: EntityType, id: impl Into<Id>) -> Self {
        Key {
            entity_type,
            id: id.into(),
        }
    }

    /// Returns the logical entity type component.
    pub fn entity_type(&self) -> &EntityType {
        &self.entity_type
    }

    /// Returns the storage identifier component.
    pub fn id(&self) -> &Id {
        &self.id
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.entity_type, self.id)
    }
}
