//! Output port for finished simulation runs.

use std::path::Path;

use crate::domain::error::SectraderError;
use crate::domain::portfolio::Portfolio;

pub trait ReportPort {
    fn write(&self, portfolio: &Portfolio, output_path: &Path) -> Result<(), SectraderError>;
}
