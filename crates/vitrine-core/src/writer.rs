use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::AppError;
use crate::models::Product;
use crate::schema::RecordSchema;

/// Writes products as CSV with a header row in schema order.
#[derive(Debug, Clone, Default)]
pub struct TabularWriter {
    schema: RecordSchema,
}

impl TabularWriter {
    pub fn new(schema: RecordSchema) -> Self {
        Self { schema }
    }

    /// Write header plus one row per record to `sink`, then flush.
    ///
    /// On error the sink may hold a partial document and must be discarded.
    pub fn write<W: Write>(&self, records: &[Product], sink: W) -> Result<(), AppError> {
        let mut writer = csv::Writer::from_writer(sink);
        writer.write_record(self.schema.field_names())?;
        for record in records {
            writer.write_record(self.schema.row(record))?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Write to `path` atomically: the file is either fully replaced or left
    /// as it was.
    pub fn write_to_path(&self, records: &[Product], path: &Path) -> Result<(), AppError> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut staged = NamedTempFile::new_in(dir).map_err(|e| {
            AppError::WriteError(format!("Cannot stage output in {}: {e}", dir.display()))
        })?;
        self.write(records, staged.as_file_mut())?;
        staged.as_file().sync_all()?;

        staged.persist(path).map_err(|e| {
            AppError::WriteError(format!("Cannot replace {}: {}", path.display(), e.error))
        })?;

        tracing::debug!(path = %path.display(), rows = records.len(), "Wrote CSV");
        Ok(())
    }
}
