//! Core system components shared by the decision engine and the firmware
pub mod clock;
pub mod config;
pub mod drive_command;
pub mod state;
