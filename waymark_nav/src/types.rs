// Strongly-typed identifiers shared across the navmesh.
//
// `NodeId` and `PolygonId` are handed out by monotonic counters owned by
// `NavGraph` and `NavMesh` respectively, and are never reused, so a stale id
// can only ever miss rather than alias a newer node. `ObstacleId` is chosen by
// the caller and is how obstacles are deduplicated and removed.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! nav_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    };
}

nav_id!(
    /// Handle to a node in the `NavGraph` arena.
    NodeId
);
nav_id!(
    /// Caller-assigned identity of an obstacle body.
    ObstacleId
);
nav_id!(
    /// Handle to one expanded polygon. Compound bodies own several.
    PolygonId
);
