pub mod color;
pub mod decode;
pub mod fetch;
pub mod loader;
