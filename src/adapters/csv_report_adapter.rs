//! Transaction ledger export as CSV.

use std::path::Path;

use crate::domain::error::SectraderError;
use crate::domain::portfolio::Portfolio;
use crate::ports::report_port::ReportPort;

pub const LEDGER_HEADER: [&str; 7] = ["date", "security", "type", "price", "quantity", "amount", "cash"];

#[derive(Debug, Default)]
pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn new() -> Self {
        Self
    }

    /// Writes the ledger to any writer.
    pub fn write_to<W: std::io::Write>(&self, portfolio: &Portfolio, out: W) -> Result<(), SectraderError> {
        let mut wtr = csv::Writer::from_writer(out);
        wtr.write_record(LEDGER_HEADER).map_err(csv_err)?;

        for t in portfolio.transactions() {
            wtr.write_record([
                t.date.format("%Y-%m-%d").to_string(),
                t.security.clone(),
                t.kind.to_string(),
                format!("{:.4}", t.price),
                t.quantity.to_string(),
                format!("{:.4}", t.amount),
                format!("{:.4}", t.cash_after),
            ])
            .map_err(csv_err)?;
        }

        wtr.flush()?;
        Ok(())
    }
}

fn csv_err(e: csv::Error) -> SectraderError {
    match e.into_kind() {
        csv::ErrorKind::Io(io) => SectraderError::Io(io),
        other => SectraderError::Data {
            reason: format!("CSV write error: {:?}", other),
        },
    }
}

impl ReportPort for CsvReportAdapter {
    fn write(&self, portfolio: &Portfolio, output_path: &Path) -> Result<(), SectraderError> {
        let file = std::fs::File::create(output_path)?;
        self.write_to(portfolio, file)
    }
}
