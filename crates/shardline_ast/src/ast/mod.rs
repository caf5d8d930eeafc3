mod attributes;
mod bound;
mod ddl;
mod dml;
mod expr;
mod ident;
mod prepare;
mod select;
mod table;

pub use attributes::*;
pub use bound::*;
pub use ddl::*;
pub use dml::*;
pub use expr::*;
pub use ident::*;
pub use prepare::*;
pub use select::*;
pub use table::*;
