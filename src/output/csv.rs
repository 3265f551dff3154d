//! CSV export of raw samples

use crate::error::{AppError, Result};
use crate::models::Sample;
use std::io::{BufWriter, Write};
use std::path::Path;

pub const CSV_HEADER: &str = "start_time,duration_ms,status";

/// Write one row per sample, ordered by start time
pub fn write_samples_csv(path: &Path, samples: &[Sample]) -> Result<()> {
    let file = std::fs::File::create(path)
        .map_err(|e| AppError::io(format!("Failed to create {}: {}", path.display(), e)))?;
    let mut writer = BufWriter::new(file);
    write_samples(&mut writer, samples)?;
    writer.flush()?;
    Ok(())
}

/// Write the CSV body to any writer
pub fn write_samples<W: Write>(writer: &mut W, samples: &[Sample]) -> Result<()> {
    let mut ordered: Vec<&Sample> = samples.iter().collect();
    ordered.sort_by_key(|s| s.start_time);

    writeln!(writer, "{}", CSV_HEADER)?;
    for sample in ordered {
        writeln!(
            writer,
            "{},{},{}",
            sample.start_time.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            sample.duration_ms,
            sample.status
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::time::Duration;

    #[test]
    fn test_rows_are_time_ordered() {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let samples = vec![
            Sample::failed(t0 + chrono::Duration::milliseconds(250), Duration::from_millis(9)),
            Sample::success(t0, Duration::from_millis(3)),
        ];

        let mut out = Vec::new();
        write_samples(&mut out, &samples).unwrap();
        let text = String::from_utf8(out).unwrap();

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], CSV_HEADER);
        assert_eq!(lines[1], "2024-01-02T03:04:05.000Z,3,success");
        assert_eq!(lines[2], "2024-01-02T03:04:05.250Z,9,failed");
    }

    #[test]
    fn test_write_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("samples.csv");
        write_samples_csv(&path, &[Sample::success(Utc::now(), Duration::ZERO)]).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap().lines().count(), 2);
    }
}
