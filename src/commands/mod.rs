pub mod check;
pub mod run;

use std::path::PathBuf;

pub fn to_paths(args: &[String]) -> Vec<PathBuf> {
    args.iter().map(PathBuf::from).collect()
}
