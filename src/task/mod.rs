pub mod combat;
pub mod drive;
pub mod mode_select;
pub mod resources;
pub mod sensors;
