pub mod change_sink;
pub mod logging_sink;
