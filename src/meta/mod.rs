//! Dataset metadata: descriptions, values, value types and identity types.

mod desc;
mod idtype;
mod value;

pub use desc::{DataKind, DatasetDesc, DEFAULT_COLTYPE, DEFAULT_ROWTYPE};
pub(crate) use desc::now_millis;
pub use idtype::{IdType, IdTypeRegistry, IdTypeResolver, ProductIdType};
pub use value::{guess_value_type, Category, Value, ValueTypeDesc};
