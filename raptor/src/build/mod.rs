//! Building an index from a bin-list file.

pub mod bin_list;
pub mod driver;
pub mod options;
pub mod reader;

pub use driver::{build, BuildOutput};
pub use options::BuildOptions;
pub use reader::FileReader;
