//! Dataset loading and writing.

mod candidates;
mod output;
mod reader;
mod samples;

pub use candidates::{load_candidates, write_candidates};
pub use output::{write_results, write_results_to_path};
pub use reader::open_input;
pub use samples::load_samples;
