//! Schema declaration macros
//!
//! Generate the descriptor and codec impls that a reflection-based
//! serializer would derive at runtime.

/// Declare an ordered-object type.
///
/// Fields encode in declaration order. `=> "key"` renames a field's
/// serial key; `= expr` declares a default, which makes the field optional
/// on decode and omittable on sparse encode.
///
/// # Example
/// ```
/// use firebase_common::encoding::{decode, encode, DecodeSettings, EncodeSettings, PlainValue};
/// use firebase_common::firestore_class;
///
/// firestore_class! {
///     #[derive(Debug, Clone, PartialEq)]
///     pub struct City as "City" {
///         pub name: String,
///         pub population: i64 => "pop" = 0,
///     }
/// }
///
/// let city = City { name: "Oslo".into(), population: 700_000 };
/// let encoded = encode(&city, &EncodeSettings::default()).unwrap();
/// assert_eq!(encoded.get("pop"), Some(&PlainValue::Long(700_000)));
///
/// let decoded: City = decode(&encoded, &DecodeSettings::default()).unwrap();
/// assert_eq!(decoded, city);
/// ```
#[macro_export]
macro_rules! firestore_class {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident $(as $serial:literal)? {
            $(
                $(#[$fmeta:meta])*
                $fvis:vis $field:ident : $ty:ty $(=> $key:literal)? $(= $default:expr)?
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $(
                $(#[$fmeta])*
                $fvis $field: $ty,
            )*
        }

        impl $crate::encoding::ClassSchema for $name {
            fn class_descriptor() -> $crate::encoding::SchemaDescriptor {
                static DESCRIPTOR: $crate::__private::Lazy<$crate::encoding::SchemaDescriptor> =
                    $crate::__private::Lazy::new(|| {
                        $crate::encoding::SchemaDescriptor::class($crate::__serial_name!($name $(, $serial)?))
                            $(
                                .element(
                                    $crate::encoding::ElementDescriptor::new(
                                        $crate::__field_key!($field $(, $key)?),
                                        <$ty as $crate::encoding::Schema>::descriptor,
                                    )
                                    .optional($crate::__has_default!($($default)?)),
                                )
                            )*
                    });
                DESCRIPTOR.clone()
            }

            #[allow(unused_variables)]
            fn encode_fields(
                &self,
                fields: &mut $crate::encoding::ClassEncoder<'_>,
            ) -> ::std::result::Result<(), $crate::EncodingError> {
                $(
                    $crate::__encode_field!(fields, self.$field, $crate::__field_key!($field $(, $key)?) $(, $default)?);
                )*
                Ok(())
            }

            #[allow(unused_variables)]
            fn decode_fields(
                fields: &$crate::encoding::ClassDecoder<'_>,
            ) -> ::std::result::Result<Self, $crate::EncodingError> {
                Ok(Self {
                    $(
                        $field: $crate::__decode_field!(fields, $crate::__field_key!($field $(, $key)?) $(, $default)?),
                    )*
                })
            }
        }

        impl $crate::encoding::Schema for $name {
            fn descriptor() -> $crate::encoding::SchemaDescriptor {
                <Self as $crate::encoding::ClassSchema>::class_descriptor()
            }
        }

        impl $crate::encoding::Encodable for $name {
            fn encode(
                &self,
                encoder: &$crate::encoding::Encoder<'_>,
            ) -> ::std::result::Result<$crate::encoding::PlainValue, $crate::EncodingError> {
                encoder.encode_class(self)
            }
        }

        impl $crate::encoding::Decodable for $name {
            fn decode(
                value: &$crate::encoding::PlainValue,
                decoder: &$crate::encoding::Decoder<'_>,
            ) -> ::std::result::Result<Self, $crate::EncodingError> {
                decoder.decode_class(value)
            }
        }
    };
}

/// Declare a C-like enum encoded by case name.
///
/// Derives `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq` and `Hash`.
/// `=> "NAME"` renames a case.
///
/// # Example
/// ```
/// use firebase_common::encoding::{encode, EncodeSettings, PlainValue};
/// use firebase_common::firestore_enum;
///
/// firestore_enum! {
///     pub enum Status as "Status" {
///         Active => "ACTIVE",
///         Archived => "ARCHIVED",
///     }
/// }
///
/// let encoded = encode(&Status::Archived, &EncodeSettings::default()).unwrap();
/// assert_eq!(encoded, PlainValue::from("ARCHIVED"));
/// ```
#[macro_export]
macro_rules! firestore_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident $(as $serial:literal)? {
            $(
                $(#[$vmeta:meta])*
                $variant:ident $(=> $case:literal)?
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $(
                $(#[$vmeta])*
                $variant,
            )*
        }

        impl $crate::encoding::EnumSchema for $name {
            const SERIAL_NAME: &'static str = $crate::__serial_name!($name $(, $serial)?);
            const CASES: &'static [(&'static str, Self)] = &[
                $(($crate::__field_key!($variant $(, $case)?), Self::$variant),)*
            ];

            fn case_name(&self) -> &'static str {
                match self {
                    $(Self::$variant => $crate::__field_key!($variant $(, $case)?),)*
                }
            }
        }

        impl $crate::encoding::Schema for $name {
            fn descriptor() -> $crate::encoding::SchemaDescriptor {
                $crate::encoding::SchemaDescriptor::enumeration(
                    <Self as $crate::encoding::EnumSchema>::SERIAL_NAME,
                    &[$($crate::__field_key!($variant $(, $case)?)),*],
                )
            }
        }

        impl $crate::encoding::Encodable for $name {
            fn encode(
                &self,
                encoder: &$crate::encoding::Encoder<'_>,
            ) -> ::std::result::Result<$crate::encoding::PlainValue, $crate::EncodingError> {
                encoder.encode_enum(self)
            }
        }

        impl $crate::encoding::Decodable for $name {
            fn decode(
                value: &$crate::encoding::PlainValue,
                decoder: &$crate::encoding::Decoder<'_>,
            ) -> ::std::result::Result<Self, $crate::EncodingError> {
                decoder.decode_enum(value)
            }
        }
    };
}

/// Declare a single-field wrapper that encodes as its inner value.
///
/// # Example
/// ```
/// use firebase_common::encoding::{encode, EncodeSettings, PlainValue};
/// use firebase_common::value_class;
///
/// value_class! {
///     #[derive(Debug, Clone, Copy, PartialEq)]
///     pub struct UserId(pub i32) as "UserId";
/// }
///
/// assert_eq!(encode(&UserId(42), &EncodeSettings::default()).unwrap(), PlainValue::Int(42));
/// ```
#[macro_export]
macro_rules! value_class {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident($ivis:vis $inner:ty) $(as $serial:literal)?;
    ) => {
        $(#[$meta])*
        $vis struct $name($ivis $inner);

        impl $crate::encoding::Schema for $name {
            fn descriptor() -> $crate::encoding::SchemaDescriptor {
                $crate::encoding::SchemaDescriptor::value_class(
                    $crate::__serial_name!($name $(, $serial)?),
                    <$inner as $crate::encoding::Schema>::descriptor,
                )
            }
        }

        impl $crate::encoding::Encodable for $name {
            fn encode(
                &self,
                encoder: &$crate::encoding::Encoder<'_>,
            ) -> ::std::result::Result<$crate::encoding::PlainValue, $crate::EncodingError> {
                encoder.encode_value(&self.0)
            }
        }

        impl $crate::encoding::Decodable for $name {
            fn decode(
                value: &$crate::encoding::PlainValue,
                decoder: &$crate::encoding::Decoder<'_>,
            ) -> ::std::result::Result<Self, $crate::EncodingError> {
                decoder.decode_value(value).map(Self)
            }
        }
    };
}

/// Declare a sealed hierarchy as an enum of subtypes.
///
/// Each variant wraps one ordered-object subtype; its serial name is the
/// discriminator value. The discriminator key defaults to `"type"`.
///
/// # Example
/// ```
/// use firebase_common::encoding::{encode, EncodeSettings};
/// use firebase_common::{firestore_class, firestore_sealed};
///
/// firestore_class! {
///     #[derive(Debug, Clone, PartialEq)]
///     pub struct Circle as "circle" { pub radius: f64 }
/// }
///
/// firestore_sealed! {
///     #[derive(Debug, Clone, PartialEq)]
///     pub enum Shape as "Shape" discriminator "kind" {
///         Circle(Circle),
///     }
/// }
///
/// let encoded = encode(&Shape::Circle(Circle { radius: 1.0 }), &EncodeSettings::default()).unwrap();
/// let map = encoded.as_map().unwrap();
/// assert_eq!(map.get_index(0).map(|(k, _)| k.as_str()), Some("kind"));
/// ```
#[macro_export]
macro_rules! firestore_sealed {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident $(as $serial:literal)? $(discriminator $disc:literal)? {
            $(
                $(#[$vmeta:meta])*
                $variant:ident($sub:ty)
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis enum $name {
            $(
                $(#[$vmeta])*
                $variant($sub),
            )*
        }

        impl $crate::encoding::Polymorphic for $name {
            fn base_descriptor() -> $crate::encoding::SchemaDescriptor {
                $crate::encoding::SchemaDescriptor::polymorphic($crate::__serial_name!($name $(, $serial)?))
                    $(.with_discriminator($disc))?
            }

            fn as_subtype(&self) -> &dyn ::std::any::Any {
                match self {
                    $(Self::$variant(value) => value as &dyn ::std::any::Any,)*
                }
            }

            fn sealed_subtypes() -> ::std::option::Option<
                ::std::sync::Arc<$crate::encoding::PolymorphicTable<Self>>,
            > {
                static TABLE: $crate::__private::Lazy<
                    ::std::sync::Arc<$crate::encoding::PolymorphicTable<$name>>,
                > = $crate::__private::Lazy::new(|| {
                    let mut table = $crate::encoding::PolymorphicTable::new();
                    $(table.subtype::<$sub>($name::$variant);)*
                    ::std::sync::Arc::new(table)
                });
                Some(::std::sync::Arc::clone(&TABLE))
            }
        }

        $crate::polymorphic_codec!($name);
    };
}

/// Implement the codec traits for a type that implements
/// [`Polymorphic`](crate::encoding::Polymorphic) by hand.
#[macro_export]
macro_rules! polymorphic_codec {
    ($name:ty) => {
        impl $crate::encoding::Schema for $name {
            fn descriptor() -> $crate::encoding::SchemaDescriptor {
                <Self as $crate::encoding::Polymorphic>::base_descriptor()
            }
        }

        impl $crate::encoding::Encodable for $name {
            fn encode(
                &self,
                encoder: &$crate::encoding::Encoder<'_>,
            ) -> ::std::result::Result<$crate::encoding::PlainValue, $crate::EncodingError> {
                encoder.encode_polymorphic(self)
            }
        }

        impl $crate::encoding::Decodable for $name {
            fn decode(
                value: &$crate::encoding::PlainValue,
                decoder: &$crate::encoding::Decoder<'_>,
            ) -> ::std::result::Result<Self, $crate::EncodingError> {
                decoder.decode_polymorphic(value)
            }
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __serial_name {
    ($name:ident) => {
        stringify!($name)
    };
    ($name:ident, $serial:literal) => {
        $serial
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __field_key {
    ($field:ident) => {
        stringify!($field)
    };
    ($field:ident, $key:literal) => {
        $key
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __has_default {
    () => {
        false
    };
    ($default:expr) => {
        true
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __encode_field {
    ($fields:ident, $value:expr, $key:expr) => {
        $fields.field($key, &$value)?
    };
    ($fields:ident, $value:expr, $key:expr, $default:expr) => {
        $fields.field_with_default($key, &$value, || $default)?
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __decode_field {
    ($fields:ident, $key:expr) => {
        $fields.required($key)?
    };
    ($fields:ident, $key:expr, $default:expr) => {
        $fields.optional($key, || $default)?
    };
}

#[cfg(test)]
mod tests {
    use crate::encoding::{decode, encode, DecodeSettings, EncodeSettings, PlainValue, Schema};
    use crate::error::ErrorKind;

    crate::firestore_class! {
        #[derive(Debug, Clone, PartialEq)]
        struct Profile {
            name: String,
            nickname: Option<String> = None,
            score: i32 => "points" = 0,
        }
    }

    crate::firestore_enum! {
        enum Level {
            Low => "LOW",
            High => "HIGH",
        }
    }

    crate::value_class! {
        #[derive(Debug, PartialEq)]
        struct Wrapped(Option<i32>);
    }

    #[test]
    fn test_class_descriptor_from_macro() {
        let descriptor = Profile::descriptor();
        assert_eq!(descriptor.serial_name(), "Profile");
        assert_eq!(descriptor.element_index("points"), Some(2));
        assert!(!descriptor.elements()[0].is_optional());
        assert!(descriptor.elements()[1].is_optional());
    }

    #[test]
    fn test_class_sparse_encode_skips_defaults() {
        let profile = Profile {
            name: "ada".to_string(),
            nickname: None,
            score: 0,
        };
        let sparse = EncodeSettings::builder().encode_defaults(false).build();
        let encoded = encode(&profile, &sparse).unwrap();

        let keys: Vec<&String> = encoded.as_map().unwrap().keys().collect();
        assert_eq!(keys, ["name"]);
    }

    #[test]
    fn test_class_missing_required_field() {
        let err = decode::<Profile>(&PlainValue::Map(Default::default()), &DecodeSettings::default()).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::MissingField(field) if field == "name"));
        assert_eq!(err.path()[0].descriptor, "Profile");
    }

    #[test]
    fn test_enum_macro_cases() {
        assert_eq!(encode(&Level::High, &EncodeSettings::default()).unwrap(), PlainValue::from("HIGH"));
        let decoded: Level = decode(&PlainValue::from("low"), &DecodeSettings::default()).unwrap();
        assert_eq!(decoded, Level::Low);
        assert_eq!(Level::descriptor().element_count(), 2);
    }

    #[test]
    fn test_enum_decode_by_ordinal() {
        let settings = DecodeSettings::default();
        assert_eq!(decode::<Level>(&PlainValue::Int(1), &settings).unwrap(), Level::High);
        assert_eq!(decode::<Level>(&PlainValue::Long(0), &settings).unwrap(), Level::Low);

        for ordinal in [PlainValue::Int(5), PlainValue::Long(-1)] {
            let err = decode::<Level>(&ordinal, &settings).unwrap_err();
            assert!(matches!(err.kind(), ErrorKind::UnknownEnumCase { enum_name, .. } if enum_name == "Level"));
        }
    }

    #[test]
    fn test_enum_decode_unknown_name() {
        let err = decode::<Level>(&PlainValue::from("mid"), &DecodeSettings::default()).unwrap_err();
        assert!(matches!(
            err.kind(),
            ErrorKind::UnknownEnumCase { enum_name, value } if enum_name == "Level" && value == "mid"
        ));

        let err = decode::<Level>(&PlainValue::Boolean(true), &DecodeSettings::default()).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::TypeMismatch { .. }));
    }

    #[test]
    fn test_value_class_inherits_nullability() {
        assert!(Wrapped::descriptor().is_nullable());
        assert_eq!(encode(&Wrapped(None), &EncodeSettings::default()).unwrap(), PlainValue::Null);

        let decoded: Wrapped = decode(&PlainValue::Null, &DecodeSettings::default()).unwrap();
        assert_eq!(decoded, Wrapped(None));
    }
}
