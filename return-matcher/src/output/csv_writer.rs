use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use common::{OutputType, PipelineError, Result};

/// Output file for an input: `<output_dir>/<output_type>/<stem>_returns.csv`,
/// where `stem` is the file name up to its first '.'.
pub fn output_path(output_dir: &Path, input: &Path, output_type: OutputType) -> PathBuf {
    let file_name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = file_name.split('.').next().unwrap_or_default();

    output_dir
        .join(output_type.as_str())
        .join(format!("{stem}_returns.csv"))
}

/// Write one value per line, creating the parent directory if needed
pub fn write_values_csv(path: &Path, values: &[f64]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let file = File::create(path)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(BufWriter::new(file));

    for value in values {
        writer
            .write_record([format!("{value:e}")])
            .map_err(|e| PipelineError::CsvError(e.to_string()))?;
    }
    writer.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_path() {
        let path = output_path(
            Path::new("/tmp/out"),
            Path::new("./raw/SP500_Revised.csv"),
            OutputType::Premiums,
        );
        assert_eq!(path, PathBuf::from("/tmp/out/premiums/SP500_Revised_returns.csv"));

        // only the part before the first dot survives
        let dotted = output_path(Path::new("."), Path::new("raw/gold.v2.csv"), OutputType::Prices);
        assert_eq!(dotted, PathBuf::from("./prices/gold_returns.csv"));
    }

    #[test]
    fn test_write_values_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("returns").join("x_returns.csv");

        write_values_csv(&path, &[0.5, -0.0125, 1e-10]).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let parsed: Vec<f64> = text.lines().map(|l| l.parse().unwrap()).collect();
        assert_eq!(parsed, vec![0.5, -0.0125, 1e-10]);
    }
}
