pub mod temp_dir_scratch;

pub use temp_dir_scratch::TempDirScratch;
