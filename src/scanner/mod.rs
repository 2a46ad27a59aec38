pub mod walk;

pub use walk::find_files;
