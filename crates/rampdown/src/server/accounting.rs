use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use chrono::NaiveDateTime;

use execvnode::AccountingRecord;

const TIME_FORMAT: &str = "%m/%d/%Y %H:%M:%S";

/// Append-only PBS style accounting log.
pub struct AccountingLog {
    path: PathBuf,
}

impl AccountingLog {
    pub fn new(path: PathBuf) -> Self {
        AccountingLog { path }
    }

    /// Appends all records of one job transition with a single write.
    pub fn append(&self, job_id: &str, records: &[AccountingRecord]) -> crate::Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        let now = chrono::Local::now().naive_local();
        let mut buffer = String::new();
        for record in records {
            buffer.push_str(&format_line(now, job_id, record));
            buffer.push('\n');
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(buffer.as_bytes())?;
        log::debug!(
            "Wrote {} accounting record(s) of job {job_id} to {}",
            records.len(),
            self.path.display()
        );
        Ok(())
    }
}

pub fn format_line(time: NaiveDateTime, job_id: &str, record: &AccountingRecord) -> String {
    format!(
        "{};{};{};{}",
        time.format(TIME_FORMAT),
        record.kind,
        job_id,
        record
    )
}
