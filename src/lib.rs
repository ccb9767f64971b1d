//! Builds aggregation expressions for a document database.
//!
//! Expressions are composed from [`field`] references and literal values by
//! chaining operators, then compiled to the engine's wire format with
//! [`Expr::to_mongo`]:
//!
//! ```
//! use agg_expression::field;
//! use serde_json::json;
//!
//! let bbox = field("bounding_box");
//! let area = bbox.get(2) * bbox.get(3);
//! let expr = field("detections").filter(&(area.greater(0.2) & field("confidence").greater(0.9)));
//!
//! assert_eq!(
//!     expr.to_mongo(None),
//!     json!({"$filter": {
//!         "input": "$detections",
//!         "cond": {"$and": [
//!             {"$gt": [
//!                 {"$multiply": [
//!                     {"$arrayElemAt": ["$$this.bounding_box", 2]},
//!                     {"$arrayElemAt": ["$$this.bounding_box", 3]},
//!                 ]},
//!                 0.2,
//!             ]},
//!             {"$gt": ["$$this.confidence", 0.9]},
//!         ]},
//!     }})
//! );
//! ```

pub mod errors;
pub mod context;
mod expression;
mod field;
mod comparison;
mod arithmetic;
mod array;
mod functions;
mod string;
mod ops;
mod rewrite;

pub use context::{Context, Scope};
pub use errors::{ExprError, Result};
pub use expression::{Expr, Operand};
pub use field::{field, object_id, VALUE};
pub use functions::{Lang, ScriptFunction};
pub use string::OneOrMany;
