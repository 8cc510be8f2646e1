pub mod composite;
pub(crate) mod cpu;
pub mod glyphs;
pub mod pipeline;
