pub mod unimplemented_store;
