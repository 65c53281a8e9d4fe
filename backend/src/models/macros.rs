/// Defines a newtype ID wrapper around a backend UUID primary key
/// and generates:
/// - derives (Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)
/// - `Display` and `FromStr`
/// - `From<Uuid> for $name` and `From<$name> for Uuid`
///
/// Usage:
///   define_id_type!(ClientId);
#[macro_export]
macro_rules! define_id_type {
    ($name:ident) => {
        #[derive(
            Debug,
            Copy,
            Clone,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            serde::Serialize,
            serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub ::uuid::Uuid);

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                ::std::write!(f, "{}", self.0)
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = ::uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                ::uuid::Uuid::parse_str(s).map($name)
            }
        }

        impl ::std::convert::From<::uuid::Uuid> for $name {
            fn from(v: ::uuid::Uuid) -> Self {
                $name(v)
            }
        }

        impl ::std::convert::From<$name> for ::uuid::Uuid {
            fn from(v: $name) -> Self {
                v.0
            }
        }

        impl $name {
            /// Generate a fresh random identifier.
            pub fn new() -> Self {
                $name(::uuid::Uuid::new_v4())
            }

            pub fn value(&self) -> ::uuid::Uuid {
                self.0
            }
        }

        impl ::std::default::Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }
    };
}

#[cfg(test)]
mod tests {
    crate::define_id_type!(SampleId);

    #[test]
    fn test_id_parses_and_displays() {
        let id = SampleId::new();
        let parsed: SampleId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
        assert!("not-a-uuid".parse::<SampleId>().is_err());
    }

    #[test]
    fn test_id_serializes_as_bare_uuid() {
        let id = SampleId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id.value()));
    }
}
