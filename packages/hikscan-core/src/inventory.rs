//! Device list input and CSV inventory output.

use crate::error::InventoryError;
use crate::scanner::DeviceRecord;
use std::fs;
use std::io;
use std::path::Path;

/// One line of the device list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceTarget {
    pub address: String,
    pub label: String,
}

/// Parse `address,label` lines.
///
/// Fields are trimmed and extra fields ignored. Blank lines, `#` comments and
/// lines with fewer than two fields are skipped.
pub fn parse_targets(content: &str) -> Vec<DeviceTarget> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let mut parts = line.split(',');
            let address = parts.next()?.trim();
            let label = parts.next()?.trim();
            Some(DeviceTarget {
                address: address.to_string(),
                label: label.to_string(),
            })
        })
        .collect()
}

/// Read and parse the device list at `path`.
pub fn read_targets(path: &Path) -> Result<Vec<DeviceTarget>, InventoryError> {
    if !path.exists() {
        return Err(InventoryError::InputMissing(path.to_path_buf()));
    }

    let content = fs::read_to_string(path).map_err(|source| InventoryError::InputRead {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(parse_targets(&content))
}

/// Write records as CSV with a header row.
pub fn write_records_to<W: io::Write>(writer: W, records: &[DeviceRecord]) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_writer(writer);
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Read records previously written by [`write_records_to`].
pub fn read_records_from<R: io::Read>(reader: R) -> Result<Vec<DeviceRecord>, csv::Error> {
    csv::Reader::from_reader(reader).deserialize().collect()
}

/// Create (or truncate) `path` and write the inventory to it.
pub fn write_records(path: &Path, records: &[DeviceRecord]) -> Result<(), InventoryError> {
    let to_error = |source| InventoryError::OutputWrite {
        path: path.to_path_buf(),
        source,
    };

    let file = fs::File::create(path).map_err(|e| to_error(csv::Error::from(e)))?;
    write_records_to(io::BufWriter::new(file), records).map_err(to_error)?;

    tracing::info!("Exported {} records to {}", records.len(), path.display());
    Ok(())
}

/// Read an exported inventory file.
pub fn read_records(path: &Path) -> Result<Vec<DeviceRecord>, InventoryError> {
    let to_error = |source| InventoryError::OutputRead {
        path: path.to_path_buf(),
        source,
    };

    let file = fs::File::open(path).map_err(|e| to_error(csv::Error::from(e)))?;
    read_records_from(io::BufReader::new(file)).map_err(to_error)
}
