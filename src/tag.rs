//! Type-erased, hashable identifiers for registration names and containers.
//!
//! Any `Hash + Eq + Debug + Send + Sync + 'static` value can become a [`Tag`]:
//! strings, enum variants, UUIDs. Two tags are equal only when they wrap values of
//! the same concrete type that compare equal, so `Tag::from("1")` and
//! `Tag::from(1u32)` never collide.
//!
//! Strings and primitive integers are normalized first. Every string form
//! (`&'static str`, `String`, `Box<str>`, `Arc<str>`) is stored as a `String`, and
//! every integer up to 64 bits wide as an `i128`, so `"Lucy"` and
//! `"Lucy".to_string()` name the same thing, as do `1` and `1u32`.

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

trait TagValue: Any + Send + Sync + fmt::Debug {
    fn as_any(&self) -> &dyn Any;
    fn eq_tag(&self, other: &dyn TagValue) -> bool;
    fn hash_tag(&self, state: &mut dyn Hasher);
}

impl<T> TagValue for T
where
    T: Hash + Eq + fmt::Debug + Send + Sync + 'static,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn eq_tag(&self, other: &dyn TagValue) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|other| other == self)
    }

    fn hash_tag(&self, mut state: &mut dyn Hasher) {
        TypeId::of::<T>().hash(&mut state);
        self.hash(&mut state);
    }
}

#[derive(Clone)]
enum Repr {
    Default,
    Value(Arc<dyn TagValue>),
}

/// A name or container identifier.
///
/// [`Tag::DEFAULT`] is the sentinel used whenever a name or container is omitted.
#[derive(Clone)]
pub struct Tag(Repr);

impl Tag {
    /// The well-known default name/container.
    pub const DEFAULT: Tag = Tag(Repr::Default);

    /// Wraps any hashable value.
    ///
    /// Wrapping a `Tag` returns it unchanged instead of nesting it. Strings become a
    /// `String` and integers an `i128`.
    ///
    /// ```rust
    /// use factory_registry::Tag;
    ///
    /// #[derive(Debug, PartialEq, Eq, Hash)]
    /// enum Kind {
    ///     People,
    ///     Dogs,
    /// }
    ///
    /// assert_eq!(Tag::new(Kind::Dogs), Tag::new(Kind::Dogs));
    /// assert_ne!(Tag::new(Kind::Dogs), Tag::new(Kind::People));
    /// assert_ne!(Tag::new(Kind::Dogs), Tag::DEFAULT);
    /// ```
    pub fn new<T>(value: T) -> Self
    where
        T: Hash + Eq + fmt::Debug + Send + Sync + 'static,
    {
        match normalized(&value) {
            Some(tag) => tag,
            None => Tag::wrap(value),
        }
    }

    fn wrap<T>(value: T) -> Self
    where
        T: Hash + Eq + fmt::Debug + Send + Sync + 'static,
    {
        Tag(Repr::Value(Arc::new(value)))
    }

    pub fn is_default(&self) -> bool {
        matches!(self.0, Repr::Default)
    }

    /// Returns the wrapped value if it is a `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match &self.0 {
            Repr::Default => None,
            Repr::Value(value) => value.as_any().downcast_ref::<T>(),
        }
    }
}

impl Default for Tag {
    fn default() -> Self {
        Tag::DEFAULT
    }
}

macro_rules! normalize_int {
    ($value:expr, $($ty:ty),*) => {
        $(
            if let Some(int) = $value.downcast_ref::<$ty>() {
                return Some(Tag::wrap(*int as i128));
            }
        )*
    };
}

/// The canonical tag for strings, integers and tags; `None` for anything else.
fn normalized(value: &dyn Any) -> Option<Tag> {
    if let Some(tag) = value.downcast_ref::<Tag>() {
        return Some(tag.clone());
    }
    if let Some(text) = value.downcast_ref::<&'static str>() {
        return Some(Tag::wrap(text.to_string()));
    }
    if let Some(text) = value.downcast_ref::<Box<str>>() {
        return Some(Tag::wrap(text.to_string()));
    }
    if let Some(text) = value.downcast_ref::<Arc<str>>() {
        return Some(Tag::wrap(text.to_string()));
    }
    normalize_int!(value, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);
    None
}

/// Conversion into a [`Tag`], accepted wherever a name or container is expected.
///
/// Implemented for every hashable value, so user-defined enums work directly:
///
/// ```rust
/// use factory_registry::Key;
///
/// #[derive(Debug, PartialEq, Eq, Hash)]
/// enum Container {
///     Dogs,
/// }
///
/// let key = Key::<String>::new("Fido", Container::Dogs);
/// let same = Key::<String>::in_container(Container::Dogs).with_name("Fido".to_string());
/// assert_eq!(key, same);
/// ```
pub trait IntoTag {
    fn into_tag(self) -> Tag;
}

impl<T> IntoTag for T
where
    T: Hash + Eq + fmt::Debug + Send + Sync + 'static,
{
    fn into_tag(self) -> Tag {
        Tag::new(self)
    }
}

impl PartialEq for Tag {
    fn eq(&self, other: &Self) -> bool {
        match (&self.0, &other.0) {
            (Repr::Default, Repr::Default) => true,
            (Repr::Value(a), Repr::Value(b)) => a.eq_tag(b.as_ref()),
            _ => false,
        }
    }
}

impl Eq for Tag {}

impl Hash for Tag {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match &self.0 {
            Repr::Default => 0u8.hash(state),
            Repr::Value(value) => {
                1u8.hash(state);
                value.hash_tag(state);
            }
        }
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Repr::Default => f.write_str("default"),
            Repr::Value(value) => write!(f, "{value:?}"),
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl From<&'static str> for Tag {
    fn from(value: &'static str) -> Self {
        Tag::new(value)
    }
}

impl From<String> for Tag {
    fn from(value: String) -> Self {
        Tag::new(value)
    }
}

macro_rules! tag_from_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Tag {
                fn from(value: $ty) -> Self {
                    Tag::new(value)
                }
            }
        )*
    };
}

tag_from_int!(i32, i64, u32, u64, usize);

#[cfg(test)]
mod tests {
    use super::*;
    use std::hash::DefaultHasher;

    fn hash_of(tag: &Tag) -> u64 {
        let mut hasher = DefaultHasher::new();
        tag.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_default_equals_default() {
        assert_eq!(Tag::DEFAULT, Tag::default());
        assert!(Tag::DEFAULT.is_default());
        assert_eq!(hash_of(&Tag::DEFAULT), hash_of(&Tag::default()));
    }

    #[test]
    fn test_same_value_same_type_is_equal() {
        let a = Tag::from("three");
        let b = Tag::from("three");
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
    }

    #[test]
    fn test_values_of_different_types_never_collide() {
        assert_ne!(Tag::from("1"), Tag::from(1u32));
        assert_ne!(Tag::from(1u32), Tag::new('1'));
        assert_ne!(Tag::from("default"), Tag::DEFAULT);
    }

    #[test]
    fn test_string_forms_are_one_name() {
        let literal = Tag::from("fido");
        let owned = Tag::from("fido".to_string());
        let shared = Tag::new(Arc::<str>::from("fido"));
        let boxed = Tag::new(Box::<str>::from("fido"));

        assert_eq!(literal, owned);
        assert_eq!(literal, shared);
        assert_eq!(literal, boxed);
        assert_eq!(hash_of(&literal), hash_of(&owned));
        assert_eq!(hash_of(&literal), hash_of(&shared));
    }

    #[test]
    fn test_integer_widths_are_one_name() {
        assert_eq!(Tag::from(1), Tag::from(1u32));
        assert_eq!(Tag::from(1u64), Tag::new(1u8));
        assert_eq!(hash_of(&Tag::from(1)), hash_of(&Tag::from(1usize)));
        assert_ne!(Tag::from(1), Tag::from(-1));
    }

    #[test]
    fn test_new_does_not_nest_tags() {
        let tag = Tag::from(7u32);
        assert_eq!(Tag::new(tag.clone()), tag);
        assert_eq!(Tag::new(tag).downcast_ref::<i128>(), Some(&7));
    }

    #[test]
    fn test_downcast_ref() {
        let tag = Tag::from("lucy");
        assert_eq!(tag.downcast_ref::<String>().map(String::as_str), Some("lucy"));
        assert_eq!(tag.downcast_ref::<&str>(), None);
        assert_eq!(Tag::DEFAULT.downcast_ref::<String>(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Tag::DEFAULT.to_string(), "default");
        assert_eq!(Tag::from("dogs").to_string(), "\"dogs\"");
        assert_eq!(Tag::from(3u32).to_string(), "3");
    }
}
