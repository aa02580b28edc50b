use anyhow::Result;
use std::fs::File;
use std::io::{stdout, BufWriter, Write};
use std::path::Path;

use crate::prediction::{Prediction, Residue};

/// How a prediction is written out.
#[derive(clap::ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// sequence, secondary structure and solvent accessibility on three lines
    #[default]
    Text,

    /// the prediction, per-residue classes and composition as JSON
    Json,

    /// one tab-separated line per residue with decoded classes
    Table,
}

/// Creates a `BufWriter` for the given output option. This allows for an output file to be passed
/// or otherwise will default to using standard output.
pub fn get_writer(output: &Option<String>) -> Result<BufWriter<Box<dyn Write + Send>>> {
    let writer = BufWriter::new(match output {
        Some(x) => {
            let file = File::create(Path::new(x))?;
            Box::new(file) as Box<dyn Write + Send>
        }
        None => Box::new(stdout()) as Box<dyn Write + Send>,
    });
    Ok(writer)
}

/// Writes `prediction` to `writer` in the requested format.
pub fn write_prediction(
    writer: &mut impl Write,
    prediction: &Prediction,
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Text => write!(writer, "{prediction}")?,
        OutputFormat::Json => {
            let residues: Vec<Residue> = prediction.residues().collect();
            let value = serde_json::json!({
                "sequence": prediction.sequence(),
                "secondary_structure": prediction.secondary_structure(),
                "solvent_accessibility": prediction.solvent_accessibility(),
                "composition": prediction.composition(),
                "residues": residues,
            });
            serde_json::to_writer_pretty(&mut *writer, &value)?;
            writeln!(writer)?;
        }
        OutputFormat::Table => {
            writeln!(writer, "position\tresidue\tss\tsa\tstructure\taccessibility")?;
            let symbols = prediction
                .secondary_structure()
                .chars()
                .zip(prediction.solvent_accessibility().chars());

            for (residue, (ss, sa)) in prediction.residues().zip(symbols) {
                let structure = residue.structure.map_or("unknown", |s| s.name());
                let accessibility = residue.accessibility.map_or("unknown", |a| a.name());

                writeln!(
                    writer,
                    "{}\t{}\t{ss}\t{sa}\t{structure}\t{accessibility}",
                    residue.position, residue.amino_acid
                )?;
            }
        }
    }
    writer.flush()?;
    Ok(())
}
