pub mod fonts;
pub mod layout;
pub mod shaping;
pub mod wrap;
