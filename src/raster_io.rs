use crate::types::*;
use ndarray::s;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tiff::encoder::{colortype, TiffEncoder};
use tracing::info;

pub struct RasterIO;

impl RasterIO {
    /// `Documents/TrackerShading_Exports`, or `./exports` without a
    /// documents directory.
    pub fn default_output_dir() -> PathBuf {
        match dirs::document_dir() {
            Some(dir) => dir.join("TrackerShading_Exports"),
            None => PathBuf::from(".").join("exports"),
        }
    }

    /// `<stem>_<local timestamp>.<extension>`
    pub fn export_file_name(stem: &str, extension: &str) -> String {
        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        format!("{}_{}.{}", stem, timestamp, extension)
    }

    pub fn write_json(path: &Path, result: &SimulationResult) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, result)?;
        writer.flush()?;

        info!("Wrote simulation result to {}", path.display());
        Ok(())
    }

    /// Single-band 32-bit float TIFF, first image row at the northern edge.
    pub fn write_ground_tiff(path: &Path, heatmap: &GroundHeatmap) -> Result<()> {
        let (height, width) = heatmap.grid.dim();
        if width == 0 || height == 0 {
            return Err(SimulationError::Config(format!(
                "Cannot write an empty {}x{} ground grid",
                width, height
            )));
        }
        let to_u32 = |n: usize| {
            u32::try_from(n)
                .map_err(|_| SimulationError::Config(format!("Grid dimension {} too large", n)))
        };

        let north_up: Vec<f32> = heatmap.grid.slice(s![..;-1, ..]).iter().copied().collect();

        let mut encoder = TiffEncoder::new(BufWriter::new(File::create(path)?))?;
        encoder.write_image::<colortype::Gray32Float>(to_u32(width)?, to_u32(height)?, &north_up)?;

        info!(
            "Wrote {}x{} ground heatmap to {}",
            width,
            height,
            path.display()
        );
        Ok(())
    }

    pub fn write_ground_csv(path: &Path, heatmap: &GroundHeatmap) -> Result<()> {
        let mut file = BufWriter::new(File::create(path)?);

        writeln!(file, "cell_id,x,y,shadow_fraction")?;

        let (n_rows, n_cols) = heatmap.grid.dim();
        let mut cell_id = 0;

        for row in 0..n_rows {
            for col in 0..n_cols {
                let (x, y) = heatmap.cell_center(col, row);
                writeln!(
                    file,
                    "{},{:.3},{:.3},{}",
                    cell_id,
                    x,
                    y,
                    heatmap.grid[[row, col]]
                )?;
                cell_id += 1;
            }
        }

        file.flush()?;
        Ok(())
    }

    pub fn write_hourly_csv(path: &Path, points: &[HeatmapPoint]) -> Result<()> {
        let mut file = BufWriter::new(File::create(path)?);

        writeln!(file, "day,hour,shading,irradiance")?;
        for point in points {
            writeln!(
                file,
                "{},{},{:.6},{:.3}",
                point.day, point.hour, point.shading, point.irradiance
            )?;
        }

        file.flush()?;
        Ok(())
    }
}
