pub mod delete;
pub mod insert;
pub mod stream;
pub mod update;
