//! Code for reading the raw technology cost CSV file.
use super::{input_err_msg, read_csv};
use crate::cost::{CostRow, CostTable};
use crate::error::PipelineError;
use anyhow::{Context, Result};
use std::path::Path;

/// Read a raw cost table from a CSV file.
///
/// The file must have `technology`, `parameter`, `value` and `unit` columns and may have `source`
/// and `further description` columns. Other columns are ignored. No unit conversion is done here.
///
/// # Arguments
///
/// * `file_path` - Path to the CSV file
pub fn read_cost_table(file_path: &Path) -> Result<CostTable> {
    let rows = read_csv::<CostRow>(file_path)?;
    check_rows(&rows).with_context(|| input_err_msg(file_path))?;

    Ok(CostTable::new(rows))
}

fn check_rows(rows: &[CostRow]) -> Result<(), PipelineError> {
    for row in rows {
        if row.technology.0.is_empty() || row.parameter.is_empty() {
            return Err(PipelineError::InvalidParameter(
                "Technology and parameter names cannot be empty".into(),
            ));
        }
        if !row.value.is_finite() {
            return Err(PipelineError::InvalidParameter(format!(
                "{}: value for {} must be a finite number",
                row.technology, row.parameter
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_read_cost_table() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("costs.csv");
        {
            let mut file = File::create(&file_path).unwrap();
            writeln!(
                file,
                "technology,parameter,value,unit,source,further description,currency_year\n\
                 OCGT,investment,435.0,EUR/kWel,DEA,,2015\n\
                 OCGT,efficiency,0.41,per unit,DEA,Net efficiency,2015"
            )
            .unwrap();
        }

        let table = read_cost_table(&file_path).unwrap();
        assert_eq!(table.len(), 2);
        let rows: Vec<_> = table.iter().collect();
        assert_eq!(
            *rows[0],
            CostRow {
                source: Some("DEA".into()),
                ..CostRow::new("OCGT", "investment", 435.0, "EUR/kWel")
            }
        );
        assert_eq!(rows[1].description.as_deref(), Some("Net efficiency"));
    }

    #[test]
    fn test_read_cost_table_minimal_columns() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("costs.csv");
        {
            let mut file = File::create(&file_path).unwrap();
            writeln!(file, "technology,parameter,value,unit\ngas,fuel,21.6,EUR/MWh_th").unwrap();
        }

        let table = read_cost_table(&file_path).unwrap();
        assert_eq!(
            table,
            CostTable::new(vec![CostRow::new("gas", "fuel", 21.6, "EUR/MWh_th")])
        );
    }

    #[test]
    fn test_read_cost_table_bad_value() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("costs.csv");
        {
            let mut file = File::create(&file_path).unwrap();
            writeln!(file, "technology,parameter,value,unit\ngas,fuel,inf,EUR/MWh_th").unwrap();
        }

        let err = read_cost_table(&file_path).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::InvalidParameter(_))
        ));
    }
}
