pub mod model;
pub mod path;
pub mod validate;
