//! Route Table
//!
//! Translates browser paths into exactly one named route and the page unit
//! bound to it, without a server round-trip.
//!
//! ## Routes
//!
//! | path | name |
//! |---|---|
//! | `/` | `home` |
//! | `/service` | `service` |
//! | `/service/build_from_cache` | `build_from_cache` |
//! | `/service/build_from_raw` | `build_from_raw` |
//! | `/map` | `map` |
//! | `/task-query` | `task-query` |
//! | `/rcs-web-login` | `rcs-web-login` |
//! | `/exception-records` | `exception-records` |
//!
//! Other code should navigate by name, never by literal path.
//!
//! ## Example
//!
//! ```rust
//! use agv_monitor_web::routes::{Resolution, RouteTable};
//!
//! let table = RouteTable::canonical().unwrap();
//! assert_eq!(table.resolve("/map").route_name(), Some("map"));
//! assert!(matches!(table.resolve("/missing"), Resolution::NotFound { .. }));
//! ```

mod error;
mod pattern;
mod table;

pub use error::{RouteError, RouteResult};
pub use pattern::{Constraint, PathPattern, Segment};
pub use table::{
    Resolution, RouteEntry, RouteMatch, RouteTable, FALLBACK_PAGE, ROUTE_TABLE_VERSION,
};
