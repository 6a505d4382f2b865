//! Strongly-typed identifiers used across the tuner.
//!
//! Downstream crates (cluster, oracle, tuner) should *not* use raw
//! integers for IDs. Replica IDs double as routing-table entries, so both
//! are serde transparent, and both display in the short `q3`/`r1` form
//! used throughout the logs.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! define_id {
    ($name:ident, $prefix:literal, $doc:literal) => {
        #[doc = $doc]
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            pub const fn new(v: u64) -> Self {
                Self(v)
            }

            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

define_id!(QueryId, "q", "Stable identifier of a query within a workload.");
define_id!(ReplicaId, "r", "Identifier of a read replica in the roster.");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_display_in_short_form() {
        assert_eq!(QueryId::new(3).to_string(), "q3");
        assert_eq!(ReplicaId::new(1).to_string(), "r1");
        assert_eq!(QueryId::new(3).get(), 3);
    }
}
