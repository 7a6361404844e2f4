pub(crate) mod file_state;
pub(crate) mod file_store;

pub use file_state::FileState;
pub use file_store::FileStore;
