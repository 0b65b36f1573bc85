pub mod check;
pub mod orient;
pub mod tests_cmd;
