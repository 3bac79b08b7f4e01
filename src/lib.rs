pub use crate::errors::{ErrorReporting, GenError, GenErrorCategory, GenErrorKind};
pub use crate::validate::path::FieldPath;
pub use crate::validate::{ErrorKind, ErrorList, Operation, OperationContext, ValidationError};

pub mod cli;
pub mod dispatch;
pub mod errors;
pub mod gen;
pub mod schema;
pub mod tags;
pub mod testing;
pub mod validate;
