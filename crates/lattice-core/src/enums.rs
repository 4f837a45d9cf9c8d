//! Enum types for the Lattice system.
//!
//! Each enum serializes as its canonical string form and stores that same
//! string in the backend, so `as_str`/`parse` round-trip.

// ---------------------------------------------------------------------------
// Macro: defines a closed enum with fixed string forms. Paths are absolute so
// the macro expands cleanly outside this module.
// ---------------------------------------------------------------------------
macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        $name:ident, default = $default:ident,
        variants: [
            $( ($variant:ident, $str:expr) ),+ $(,)?
        ]
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $variant, )+
        }

        impl $name {
            /// Returns the canonical string representation.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $( Self::$variant => $str, )+
                }
            }

            /// Parses the canonical string form. Returns `None` for anything else.
            pub fn parse(s: &str) -> Option<Self> {
                match s {
                    $( $str => Some(Self::$variant), )+
                    _ => None,
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::$default
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::serde::Serialize for $name {
            fn serialize<S: ::serde::Serializer>(
                &self,
                serializer: S,
            ) -> ::std::result::Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $name {
            fn deserialize<D: ::serde::Deserializer<'de>>(
                deserializer: D,
            ) -> ::std::result::Result<Self, D::Error> {
                let s = <String as ::serde::Deserialize>::deserialize(deserializer)?;
                Self::parse(&s).ok_or_else(|| {
                    <D::Error as ::serde::de::Error>::unknown_variant(&s, &[$( $str, )+])
                })
            }
        }
    };
}

pub(crate) use string_enum;

string_enum! {
    /// How strictly a collection's field constraints are enforced at ingest.
    SchemaEnforcementMode, default = None,
    variants: [
        (None, "none"),
        (Strict, "strict"),
        (Flexible, "flexible"),
        (Partial, "partial"),
    ]
}

string_enum! {
    /// Which leaf paths of a document are materialized into index tables.
    IndexingMode, default = All,
    variants: [
        (All, "all"),
        (Selective, "selective"),
        (None, "none"),
    ]
}

string_enum! {
    /// The type vocabulary shared by schema elements, field constraints, and
    /// flattened leaves. Leaves are never `Array` or `Object`; those appear
    /// only as constraint targets.
    DataType, default = String,
    variants: [
        (String, "string"),
        (Integer, "integer"),
        (Number, "number"),
        (Boolean, "boolean"),
        (Array, "array"),
        (Object, "object"),
        (Null, "null"),
    ]
}

impl DataType {
    /// Whether a leaf of type `leaf` satisfies a declared type of `self`.
    ///
    /// `number` accepts `integer`; nothing else is coerced. In particular
    /// `integer` rejects fractional literals and `boolean` rejects the
    /// strings `"true"`/`"false"`.
    pub fn accepts_leaf(self, leaf: DataType) -> bool {
        leaf == self || (self == Self::Number && leaf == Self::Integer)
    }
}

string_enum! {
    /// Comparison conditions available in a structured search filter.
    FilterCondition, default = Equals,
    variants: [
        (Equals, "Equals"),
        (NotEquals, "NotEquals"),
        (GreaterThan, "GreaterThan"),
        (GreaterThanOrEqualTo, "GreaterThanOrEqualTo"),
        (LessThan, "LessThan"),
        (LessThanOrEqualTo, "LessThanOrEqualTo"),
        (IsNull, "IsNull"),
        (IsNotNull, "IsNotNull"),
        (Contains, "Contains"),
        (StartsWith, "StartsWith"),
        (EndsWith, "EndsWith"),
        (Like, "Like"),
    ]
}

impl FilterCondition {
    /// Conditions that take no right-hand value.
    pub fn is_unary(self) -> bool {
        matches!(self, Self::IsNull | Self::IsNotNull)
    }
}

string_enum! {
    /// Result ordering for search and enumeration.
    DocumentOrdering, default = CreatedDescending,
    variants: [
        (CreatedAscending, "CreatedAscending"),
        (CreatedDescending, "CreatedDescending"),
        (UpdatedAscending, "UpdatedAscending"),
        (UpdatedDescending, "UpdatedDescending"),
        (NameAscending, "NameAscending"),
        (NameDescending, "NameDescending"),
    ]
}

impl DocumentOrdering {
    /// The `documents` column this ordering sorts on.
    pub fn column(self) -> &'static str {
        match self {
            Self::CreatedAscending | Self::CreatedDescending => "createdutc",
            Self::UpdatedAscending | Self::UpdatedDescending => "lastupdateutc",
            Self::NameAscending | Self::NameDescending => "name",
        }
    }

    /// The sort direction keyword.
    pub fn direction(self) -> &'static str {
        match self {
            Self::CreatedAscending | Self::UpdatedAscending | Self::NameAscending => "ASC",
            Self::CreatedDescending | Self::UpdatedDescending | Self::NameDescending => "DESC",
        }
    }
}
