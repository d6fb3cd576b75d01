//! Schema descriptors
//!
//! A descriptor is the ahead-of-time metadata for one type: its serial name,
//! its kind, whether it accepts null, and its elements in declaration order.
//! Element descriptors point at their child schema lazily, so recursive
//! types (a class holding a list of itself) can be described without
//! building an infinite tree.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// Discriminator key used when a polymorphic base declares none
pub const DEFAULT_DISCRIMINATOR: &str = "type";

/// Scalar kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveKind {
    /// `bool`
    Boolean,
    /// `i8`
    Byte,
    /// `i16`
    Short,
    /// `i32`
    Int,
    /// `i64`
    Long,
    /// `f32`
    Float,
    /// `f64`
    Double,
    /// `String`
    String,
    /// `char`
    Char,
}

/// Shape of a described type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaKind {
    /// Scalar
    Primitive(PrimitiveKind),
    /// Ordered object with named fields
    Class,
    /// String-keyed map
    Map,
    /// List or set
    List,
    /// Sealed or abstract base resolved through a discriminator
    Polymorphic,
    /// C-like enum encoded by case name
    Enum,
    /// Single-field wrapper encoded as its inner value
    ValueClass,
    /// Native object passed through to the store
    Special,
    /// Runtime-typed value resolved per call
    Dynamic,
}

/// One element of a descriptor
#[derive(Clone)]
pub struct ElementDescriptor {
    name: Cow<'static, str>,
    optional: bool,
    schema: fn() -> SchemaDescriptor,
}

impl ElementDescriptor {
    /// Create a required element
    pub fn new(name: impl Into<Cow<'static, str>>, schema: fn() -> SchemaDescriptor) -> Self {
        Self {
            name: name.into(),
            optional: false,
            schema,
        }
    }

    /// Mark whether the element has a declared default
    pub fn optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    /// Serial name of the element
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the element may be absent on decode
    pub fn is_optional(&self) -> bool {
        self.optional
    }

    /// Descriptor of the element's type
    pub fn schema(&self) -> SchemaDescriptor {
        (self.schema)()
    }
}

impl fmt::Debug for ElementDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementDescriptor")
            .field("name", &self.name)
            .field("optional", &self.optional)
            .finish()
    }
}

/// Metadata describing a type's shape
///
/// Cheap to clone; the element list is shared.
#[derive(Debug, Clone)]
pub struct SchemaDescriptor {
    serial_name: Cow<'static, str>,
    kind: SchemaKind,
    nullable: bool,
    discriminator: Option<Cow<'static, str>>,
    elements: Arc<Vec<ElementDescriptor>>,
}

impl SchemaDescriptor {
    fn with_kind(serial_name: impl Into<Cow<'static, str>>, kind: SchemaKind) -> Self {
        Self {
            serial_name: serial_name.into(),
            kind,
            nullable: false,
            discriminator: None,
            elements: Arc::new(Vec::new()),
        }
    }

    /// Scalar descriptor
    pub fn primitive(serial_name: &'static str, kind: PrimitiveKind) -> Self {
        Self::with_kind(serial_name, SchemaKind::Primitive(kind))
    }

    /// Ordered-object descriptor; add fields with [`element`](Self::element)
    pub fn class(serial_name: impl Into<Cow<'static, str>>) -> Self {
        Self::with_kind(serial_name, SchemaKind::Class)
    }

    /// Map descriptor with key and value element schemas
    pub fn map(key: fn() -> SchemaDescriptor, value: fn() -> SchemaDescriptor) -> Self {
        Self::with_kind("Map", SchemaKind::Map)
            .element(ElementDescriptor::new("key", key))
            .element(ElementDescriptor::new("value", value))
    }

    /// List descriptor with the item schema
    pub fn list(item: fn() -> SchemaDescriptor) -> Self {
        Self::with_kind("List", SchemaKind::List).element(ElementDescriptor::new("item", item))
    }

    /// Polymorphic base descriptor using the default discriminator
    pub fn polymorphic(serial_name: impl Into<Cow<'static, str>>) -> Self {
        Self::with_kind(serial_name, SchemaKind::Polymorphic)
    }

    /// Enum descriptor with one element per case
    pub fn enumeration(serial_name: impl Into<Cow<'static, str>>, cases: &[&'static str]) -> Self {
        let mut descriptor = Self::with_kind(serial_name, SchemaKind::Enum);
        descriptor.elements = Arc::new(
            cases
                .iter()
                .map(|case| ElementDescriptor::new(*case, unit_descriptor))
                .collect(),
        );
        descriptor
    }

    /// Wrapper descriptor around the inner schema; nullable when the inner one is
    pub fn value_class(serial_name: impl Into<Cow<'static, str>>, inner: fn() -> SchemaDescriptor) -> Self {
        let mut descriptor = Self::with_kind(serial_name, SchemaKind::ValueClass)
            .element(ElementDescriptor::new("value", inner));
        descriptor.nullable = inner().is_nullable();
        descriptor
    }

    /// Native special-value descriptor
    pub fn special(serial_name: impl Into<Cow<'static, str>>) -> Self {
        Self::with_kind(serial_name, SchemaKind::Special)
    }

    /// Runtime-typed descriptor
    pub fn dynamic(serial_name: impl Into<Cow<'static, str>>) -> Self {
        Self::with_kind(serial_name, SchemaKind::Dynamic)
    }

    /// Append an element
    pub fn element(mut self, element: ElementDescriptor) -> Self {
        Arc::make_mut(&mut self.elements).push(element);
        self
    }

    /// Set the discriminator key (polymorphic bases only)
    pub fn with_discriminator(mut self, key: impl Into<Cow<'static, str>>) -> Self {
        self.discriminator = Some(key.into());
        self
    }

    /// Same descriptor, accepting null
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Serial name
    pub fn serial_name(&self) -> &str {
        &self.serial_name
    }

    pub(crate) fn serial_name_owned(&self) -> Cow<'static, str> {
        self.serial_name.clone()
    }

    /// Kind of the described type
    pub fn kind(&self) -> SchemaKind {
        self.kind
    }

    /// Whether null is a valid value
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Discriminator key, defaulting to `"type"`
    pub fn discriminator(&self) -> &str {
        self.discriminator.as_deref().unwrap_or(DEFAULT_DISCRIMINATOR)
    }

    /// Number of elements
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// Elements in declaration order
    pub fn elements(&self) -> &[ElementDescriptor] {
        &self.elements
    }

    /// Element by index
    pub fn element_at(&self, index: usize) -> Option<&ElementDescriptor> {
        self.elements.get(index)
    }

    /// Index of the element with this name
    pub fn element_index(&self, name: &str) -> Option<usize> {
        self.elements.iter().position(|element| element.name() == name)
    }
}

fn unit_descriptor() -> SchemaDescriptor {
    SchemaDescriptor::class("Unit")
}
