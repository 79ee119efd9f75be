mod builder;
mod mutex;
mod snowflake;
mod status;

pub use builder::*;
pub use mutex::*;
pub use snowflake::*;
pub use status::*;
