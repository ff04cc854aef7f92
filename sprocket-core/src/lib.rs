mod as_value;
mod builtin;
mod cancel;
mod coercion;
mod column;
mod config;
mod cursor;
mod enums;
mod error;
mod factory;
mod memory;
mod procedure;
mod record;
mod row;
mod stitch;
mod transformer;
mod util;
mod value;

pub use ::anyhow::Context;
pub use as_value::*;
pub use builtin::*;
pub use cancel::*;
pub use coercion::*;
pub use column::*;
pub use config::*;
pub use cursor::*;
pub use enums::*;
pub use error::*;
pub use factory::*;
pub use memory::*;
pub use procedure::*;
pub use record::*;
pub use row::*;
pub use stitch::*;
pub use transformer::*;
pub use util::*;
pub use value::*;
pub mod stream {
    pub use ::futures::stream::*;
}
pub use ::futures::future;

pub type Result<T> = anyhow::Result<T>;
pub type Error = anyhow::Error;
