pub mod value;
pub mod domain;
pub mod parameter;
pub mod configuration;
pub mod errors;

pub use value::*;
pub use domain::*;
pub use parameter::*;
pub use configuration::*;
pub use errors::*;
