//! Dynamic value model the rule engine validates.

use serde::Serialize;
use std::fmt;

/// A value handed to the rule engine.
///
/// Rust has no runtime reflection, so values are lowered into this enum before
/// validation. Structs take part by implementing [`Validatable`].
///
/// # Examples
///
/// ```rust
/// use tagcheck::core::Value;
///
/// assert_eq!(Value::from(8080u16).kind(), "uint");
/// assert_eq!(Value::from("debug").kind(), "string");
/// assert!(Value::ptr(None::<i64>).is_nil());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// An untyped nil.
    Nil,
    /// A boolean.
    Bool(bool),
    /// Any signed integer.
    Int(i64),
    /// Any unsigned integer.
    Uint(u64),
    /// Any float.
    Float(f64),
    /// A string.
    String(String),
    /// A list of values.
    List(Vec<Value>),
    /// A typed pointer; `None` holds no referent.
    Pointer(Option<Box<Value>>),
    /// A struct with tagged fields.
    Struct(Struct),
}

impl Value {
    /// Build a pointer value from an optional referent.
    pub fn ptr<T: Into<Value>>(value: Option<T>) -> Self {
        Self::Pointer(value.map(|v| Box::new(v.into())))
    }

    /// A typed pointer holding no referent.
    pub fn null_ptr() -> Self {
        Self::Pointer(None)
    }

    /// Short name of the value's kind, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Nil => "nil",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Uint(_) => "uint",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::List(_) => "slice",
            Self::Pointer(_) => "ptr",
            Self::Struct(_) => "struct",
        }
    }

    /// Whether this is an untyped nil or a pointer without referent.
    pub fn is_nil(&self) -> bool {
        matches!(self, Self::Nil | Self::Pointer(None))
    }

    /// Whether this is the zero value of its kind.
    ///
    /// A non-nil pointer is never zero, whatever it points to.
    pub fn is_zero(&self) -> bool {
        match self {
            Self::Nil | Self::Pointer(None) => true,
            Self::Pointer(Some(_)) => false,
            Self::Bool(b) => !b,
            Self::Int(n) => *n == 0,
            Self::Uint(n) => *n == 0,
            Self::Float(n) => *n == 0.0,
            Self::String(s) => s.is_empty(),
            Self::List(items) => items.is_empty(),
            Self::Struct(s) => s.fields.iter().all(|f| f.value.is_zero()),
        }
    }

    /// Follow non-nil pointers down to the referent.
    pub fn indirect(&self) -> &Value {
        let mut current = self;
        while let Self::Pointer(Some(inner)) = current {
            current = inner;
        }
        current
    }

    /// The string, if this is one.
    pub fn as_str(&self) -> Option<&str> {
        match self.indirect() {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// The boolean, if this is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self.indirect() {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The value as `i64`, if it is an integer that fits.
    pub fn as_i64(&self) -> Option<i64> {
        match self.indirect() {
            Self::Int(n) => Some(*n),
            Self::Uint(n) => i64::try_from(*n).ok(),
            _ => None,
        }
    }

    /// The value as `u64`, if it is a non-negative integer.
    pub fn as_u64(&self) -> Option<u64> {
        match self.indirect() {
            Self::Int(n) => u64::try_from(*n).ok(),
            Self::Uint(n) => Some(*n),
            _ => None,
        }
    }

    /// The value as `f64`, if it is numeric.
    pub fn as_f64(&self) -> Option<f64> {
        match self.indirect() {
            Self::Int(n) => Some(*n as f64),
            Self::Uint(n) => Some(*n as f64),
            Self::Float(n) => Some(*n),
            _ => None,
        }
    }

    /// Whether this is an integer or float.
    pub fn is_number(&self) -> bool {
        matches!(
            self.indirect(),
            Self::Int(_) | Self::Uint(_) | Self::Float(_)
        )
    }

    /// Length for strings (in characters) and lists (in elements).
    pub fn len(&self) -> Option<usize> {
        match self.indirect() {
            Self::String(s) => Some(s.chars().count()),
            Self::List(items) => Some(items.len()),
            _ => None,
        }
    }

    /// The list elements, if this is a list.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self.indirect() {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// The struct, if this is one.
    pub fn as_struct(&self) -> Option<&Struct> {
        match self.indirect() {
            Self::Struct(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nil | Self::Pointer(None) => f.write_str("<nil>"),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Int(n) => write!(f, "{}", n),
            Self::Uint(n) => write!(f, "{}", n),
            Self::Float(n) => write!(f, "{}", n),
            Self::String(s) => f.write_str(s),
            Self::Pointer(Some(inner)) => write!(f, "{}", inner),
            Self::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            Self::Struct(s) => {
                write!(f, "{}{{", s.name)?;
                for (i, field) in s.fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{}", field.value)?;
                }
                f.write_str("}")
            }
        }
    }
}

/// A struct lowered into named, tagged fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Struct {
    /// Type name, used as the first segment of field namespaces.
    pub name: &'static str,
    /// Fields in declaration order.
    pub fields: Vec<Field>,
}

impl Struct {
    /// Start describing a struct.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            fields: Vec::new(),
        }
    }

    /// Append a field with its rule tag.
    pub fn field(mut self, name: &'static str, tag: &'static str, value: impl Into<Value>) -> Self {
        self.fields.push(Field {
            name,
            tag,
            value: value.into(),
        });
        self
    }

    /// Look up a field by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| &f.value)
    }
}

/// One struct field together with its rule tag.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    /// Field name.
    pub name: &'static str,
    /// Rule tag, e.g. `required,gt=1024`.
    pub tag: &'static str,
    /// Field value.
    pub value: Value,
}

/// Types whose fields carry validation tags.
///
/// # Examples
///
/// ```rust
/// use tagcheck::core::{Struct, Validatable};
///
/// struct Listener {
///     port: u16,
///     level: String,
/// }
///
/// impl Validatable for Listener {
///     fn describe(&self) -> Struct {
///         Struct::new("Listener")
///             .field("port", "required,gt=1024,lt=65536", self.port)
///             .field("level", "oneof=debug info warn error", self.level.as_str())
///     }
/// }
///
/// let listener = Listener { port: 8080, level: "info".into() };
/// assert!(tagcheck::validate_struct(&listener).is_ok());
/// ```
pub trait Validatable {
    /// Lower `self` into a [`Struct`].
    fn describe(&self) -> Struct;
}

impl<T: Validatable> From<&T> for Value {
    fn from(value: &T) -> Self {
        Self::Struct(value.describe())
    }
}

impl From<Struct> for Value {
    fn from(value: Struct) -> Self {
        Self::Struct(value)
    }
}

macro_rules! impl_from_int {
    ($variant:ident, $target:ty: $($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(value: $t) -> Self {
                    Self::$variant(value as $target)
                }
            }
        )*
    };
}

impl_from_int!(Int, i64: i8, i16, i32, i64, isize);
impl_from_int!(Uint, u64: u8, u16, u32, u64, usize);
impl_from_int!(Float, f64: f32, f64);

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(value: Vec<T>) -> Self {
        Self::List(value.into_iter().map(Into::into).collect())
    }
}

impl<T: Clone + Into<Value>> From<&[T]> for Value {
    fn from(value: &[T]) -> Self {
        Self::List(value.iter().cloned().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Inner {
        name: String,
    }

    impl Validatable for Inner {
        fn describe(&self) -> Struct {
            Struct::new("Inner")
                .field("name", "required", self.name.as_str())
        }
    }

    #[test]
    fn test_kinds() {
        assert_eq!(Value::from(-1i32).kind(), "int");
        assert_eq!(Value::from(1usize).kind(), "uint");
        assert_eq!(Value::from(1.5f32).kind(), "float");
        assert_eq!(Value::from(true).kind(), "bool");
        assert_eq!(Value::from(vec!["a", "b"]).kind(), "slice");
        assert_eq!(Value::Nil.kind(), "nil");
        assert_eq!(Value::null_ptr().kind(), "ptr");
    }

    #[test]
    fn test_zero_values() {
        assert!(Value::from(0i64).is_zero());
        assert!(Value::from("").is_zero());
        assert!(Value::from(false).is_zero());
        assert!(Value::null_ptr().is_zero());
        assert!(!Value::ptr(Some(0i64)).is_zero());
        let inner = Inner {
            name: String::new(),
        };
        assert!(Value::from(&inner).is_zero());
        assert!(!Value::from(&Inner { name: "x".into() }).is_zero());
    }

    #[test]
    fn test_indirect_follows_pointers() {
        let value = Value::ptr(Some(Value::ptr(Some("deep"))));
        assert_eq!(value.as_str(), Some("deep"));
        assert_eq!(value.len(), Some(4));
    }

    #[test]
    fn test_numeric_accessors() {
        assert_eq!(Value::from(u64::MAX).as_i64(), None);
        assert_eq!(Value::from(-3i64).as_u64(), None);
        assert_eq!(Value::from(7u8).as_f64(), Some(7.0));
        assert_eq!(Value::from("7").as_f64(), None);
    }

    #[test]
    fn test_len_counts_characters() {
        assert_eq!(Value::from("héllo").len(), Some(5));
        assert_eq!(Value::from(vec![1, 2, 3]).len(), Some(3));
        assert_eq!(Value::from(3).len(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::from("qwe").to_string(), "qwe");
        assert_eq!(Value::from(1).to_string(), "1");
        assert_eq!(Value::Nil.to_string(), "<nil>");
        assert_eq!(Value::from(vec![1, 2]).to_string(), "[1 2]");
        assert_eq!(
            Value::from(&Inner { name: "x".into() }).to_string(),
            "Inner{x}"
        );
    }

    #[test]
    fn test_struct_lookup() {
        let s = Inner { name: "x".into() }.describe();
        assert_eq!(s.get("name"), Some(&Value::from("x")));
        assert_eq!(s.get("missing"), None);
    }
}
