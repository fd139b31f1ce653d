pub mod config_directory;
