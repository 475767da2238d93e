use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{CustomError, Result};
use crate::model::VariantRecord;

// Header-less .psam files follow the .fam column order
const FAM_IID_COLUMN: usize = 1;
// Header-less .pvar files follow the .bim column order
const BIM_CHROM_COLUMN: usize = 0;
const BIM_ID_COLUMN: usize = 1;
const BIM_POS_COLUMN: usize = 3;

fn open_lines(path: &impl AsRef<Path>) -> Result<impl Iterator<Item = Result<String>>> {
    let f = File::open(path).map_err(|e| CustomError::ReadWithPath {
        source: e,
        path: path.as_ref().to_path_buf(),
    })?;
    let path = path.as_ref().to_path_buf();
    Ok(BufReader::new(f).lines().map(move |line| {
        line.map_err(|e| CustomError::ReadWithPath {
            source: e,
            path: path.clone(),
        })
    }))
}

/// Reads sample IDs from a PLINK 2 .psam file (or a header-less .fam-like file).
pub(crate) fn read_psam(path: &impl AsRef<Path>) -> Result<Vec<String>> {
    let mut iid_column = None;
    let mut sample_ids = Vec::new();

    for (line_idx, line) in open_lines(path)?.enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(header) = line.strip_prefix('#') {
            let columns: Vec<&str> = header.split_whitespace().collect();
            iid_column = columns.iter().position(|&c| c == "IID");
            continue;
        }

        let fields: Vec<&str> = line.split_whitespace().collect();
        let column = match iid_column {
            Some(column) => column,
            None if fields.len() == 1 => 0,
            None => FAM_IID_COLUMN,
        };
        let sample_id = fields.get(column).ok_or(CustomError::PsamFields {
            line_num: line_idx + 1,
            n_fields: fields.len(),
            expected: column + 1,
        })?;
        sample_ids.push(sample_id.to_string());
    }
    Ok(sample_ids)
}

/// Reads the variant index from a PLINK 2 .pvar file (or a header-less .bim-like file).
/// Frequencies are left as NaN; they are derived from the genotypes later.
pub(crate) fn read_pvar(path: &impl AsRef<Path>) -> Result<Vec<VariantRecord>> {
    let mut columns = (BIM_CHROM_COLUMN, BIM_ID_COLUMN, BIM_POS_COLUMN);
    let mut variants = Vec::new();

    for (line_idx, line) in open_lines(path)?.enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with("##") {
            continue;
        }
        if let Some(header) = line.strip_prefix('#') {
            let names: Vec<&str> = header.split_whitespace().collect();
            let find = |name: &str| names.iter().position(|&c| c == name);
            if let (Some(chrom), Some(id), Some(pos)) = (find("CHROM"), find("ID"), find("POS")) {
                columns = (chrom, id, pos);
            }
            continue;
        }

        let fields: Vec<&str> = line.split_whitespace().collect();
        let (chrom_col, id_col, pos_col) = columns;
        let expected = chrom_col.max(id_col).max(pos_col) + 1;
        if fields.len() < expected {
            return Err(CustomError::PvarFields {
                line_num: line_idx + 1,
                n_fields: fields.len(),
                expected,
            });
        }
        let pos = fields[pos_col]
            .parse::<u64>()
            .map_err(|e| CustomError::PvarPosition {
                source: e,
                value: fields[pos_col].to_string(),
                line_num: line_idx + 1,
            })?;
        variants.push(VariantRecord::new(
            fields[id_col],
            fields[chrom_col],
            pos,
            f64::NAN,
        ));
    }
    Ok(variants)
}
