//! Commands - 改变表单状态的操作

mod controller_commands;

pub use controller_commands::Command;
