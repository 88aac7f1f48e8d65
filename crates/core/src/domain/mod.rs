pub mod field;
pub mod lead;
pub mod slot;
pub mod state;
