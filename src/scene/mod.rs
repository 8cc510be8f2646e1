pub mod model;
pub mod payload;
pub mod validate;
