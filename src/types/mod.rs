//! Shared primitive types.

mod call;
pub use call::*;

mod call_set;
pub use call_set::*;

mod multicall;
pub use multicall::*;

mod result;
pub use result::*;
