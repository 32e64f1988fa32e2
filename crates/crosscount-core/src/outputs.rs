use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use polars::io::parquet::write::{ParquetCompression, ParquetWriter, StatisticsOptions};
use polars::prelude::DataFrame;
use tracing::info;

use crate::error::Result;
use crate::pipeline::PipelineOutput;

pub const READINGS_FILE: &str = "readings.parquet";
pub const SUMMARY_FILE: &str = "summary.json";

/// Writes the enriched readings, every report table and the run summary into `dir`.
/// Returns the written paths in write order.
pub fn write_outputs(output: &PipelineOutput, dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;
    let mut written = Vec::new();

    let readings_path = dir.join(READINGS_FILE);
    write_parquet(&output.readings, &readings_path)?;
    written.push(readings_path);

    for (name, table) in output.reports.named() {
        let path = dir.join(format!("{name}.parquet"));
        write_parquet(table, &path)?;
        written.push(path);
    }

    let mut summary = output.summary.clone();
    summary.outputs = written
        .iter()
        .map(|path| path.display().to_string())
        .collect();

    let summary_path = dir.join(SUMMARY_FILE);
    let writer = BufWriter::new(File::create(&summary_path)?);
    serde_json::to_writer_pretty(writer, &summary)?;
    written.push(summary_path);

    info!(dir = %dir.display(), files = written.len(), "wrote report outputs");
    Ok(written)
}

pub fn write_parquet(df: &DataFrame, path: &Path) -> Result<()> {
    let mut file = File::create(path)?;
    let mut clone = df.clone();
    ParquetWriter::new(&mut file)
        .with_compression(ParquetCompression::Zstd(None))
        .with_statistics(StatisticsOptions::default())
        .finish(&mut clone)?;
    Ok(())
}
