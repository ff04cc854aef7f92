//! Maps the result sets returned by stored procedures onto Rust values: scalars,
//! enums and flags, records, schema-less rows and parent/child object graphs.
//!
//! ```ignore
//! use sprocket::{CancellationToken, Procedure, Record};
//!
//! #[derive(Default, Record)]
//! #[sprocket(rename_all = "PascalCase")]
//! struct Order {
//!     id: i32,
//!     customer: String,
//!     #[sprocket(children(foreign_key = "order_id"))]
//!     lines: Vec<OrderLine>,
//! }
//!
//! let orders = Procedure::<(Order,)>::new("GetOrders")
//!     .schema("sales")
//!     .execute(&mut cursor, &CancellationToken::new())?
//!     .0;
//! ```
pub use sprocket_core::*;
pub use sprocket_macros::*;
