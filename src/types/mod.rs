//! Type definitions

pub mod address;
pub mod package;
pub mod route;
pub mod settings;
pub mod stop;
pub mod time_format;

pub use address::*;
pub use package::*;
pub use route::*;
pub use settings::*;
pub use stop::*;
