mod cfa;
pub mod op;
mod secret;

pub use cfa::{Cfa, CfaConversionError, XOF_CURRENCY_CODE, XOF_CURRENCY_CODE_LOWER};
pub use secret::Secret;
