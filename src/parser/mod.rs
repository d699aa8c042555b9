pub mod types;
pub mod yaml;

pub use types::{LoginSpec, StepSpec, Suite};
pub use yaml::{builtin_names, builtin_suite, load_suites, parse_suite_file, DEFAULT_SUITE};
