/// Write-transaction wrapper for tree mutation
///
/// All structural mutation of a [`SourceUnit`] goes through [`transact`]:
/// the closure works on a copy, and only a successful run is committed back.
/// A failing transaction leaves the unit exactly as it was, so a file is
/// never left half-transformed in memory.
use crate::java::ast::SourceUnit;

pub fn transact<T>(
    unit: &mut SourceUnit,
    name: &str,
    f: impl FnOnce(&mut SourceUnit) -> Result<T, String>,
) -> Result<T, String> {
    let mut work = unit.clone();
    match f(&mut work) {
        Ok(value) => {
            *unit = work;
            Ok(value)
        }
        Err(e) => Err(format!("{}: {}", name, e)),
    }
}
