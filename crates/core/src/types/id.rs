//! Newtype IDs for backend entity references.
//!
//! Every record the lending backend hands out is keyed by an integer primary
//! key. Wrapping them keeps a client ID from being passed where a credit type
//! ID is expected, which matters most in the wizard where several foreign
//! keys travel together.

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around `i64` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Conversion methods: `new()`, `get()`
/// - `From<i64>`, `Into<i64>`, `Display` and `FromStr`
///
/// # Example
///
/// ```rust
/// # use lendix_core::define_id;
/// define_id!(LoanId);
/// define_id!(BranchId);
///
/// let loan = LoanId::new(7);
/// assert_eq!(loan.get(), 7);
/// assert_eq!("7".parse::<LoanId>().unwrap(), loan);
///
/// // These are different types, so this won't compile:
/// // let _: BranchId = loan;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Create a new ID from a raw backend key.
            #[must_use]
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            /// Get the raw backend key.
            #[must_use]
            pub const fn get(&self) -> i64 {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = ::core::num::ParseIntError;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                s.trim().parse::<i64>().map(Self)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id!(UserId);
define_id!(CompanyId);
define_id!(ClientId);
define_id!(DocumentationId);
define_id!(EmploymentId);
define_id!(AddressId);
define_id!(CreditTypeId);
define_id!(CreditId);
define_id!(PaymentId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_id_serializes_as_bare_integer() {
        let id = ClientId::new(42);
        assert_eq!(serde_json::to_string(&id).unwrap(), "42");

        let parsed: ClientId = serde_json::from_str("42").unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_id_from_str_trims_whitespace() {
        assert_eq!(" 9 ".parse::<CreditTypeId>().unwrap(), CreditTypeId::new(9));
        assert!("nine".parse::<CreditTypeId>().is_err());
    }

    #[test]
    fn test_id_display() {
        assert_eq!(CreditId::new(1001).to_string(), "1001");
    }
}
