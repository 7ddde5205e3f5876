//! Minimal MATLAB Level 5 MAT-file writer for real double matrices.
//!
//! Layout: a 128-byte header followed by one `miMATRIX` element per variable.
//! All data is little-endian and every data element is padded to 8 bytes.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::Utc;
use common::{PipelineError, Result};
use ndarray::Array2;

const HEADER_TEXT_LEN: usize = 116;
const MAT_VERSION: u16 = 0x0100;

const MI_INT8: u32 = 1;
const MI_INT32: u32 = 5;
const MI_UINT32: u32 = 6;
const MI_DOUBLE: u32 = 9;
const MI_MATRIX: u32 = 14;

const MX_DOUBLE_CLASS: u32 = 6;

fn padded(len: usize) -> usize {
    len.div_ceil(8) * 8
}

/// Element lengths are stored as u32
fn len_u32(len: usize, what: &str) -> Result<u32> {
    u32::try_from(len).map_err(|_| {
        PipelineError::InvalidConfig(format!("{what} of {len} bytes exceeds the MAT element limit"))
    })
}

/// Byte length of the real part of a `rows` x `cols` double matrix
fn data_byte_len(rows: usize, cols: usize) -> Result<usize> {
    let len = rows
        .checked_mul(cols)
        .and_then(|n| n.checked_mul(8))
        .ok_or_else(|| {
            PipelineError::InvalidConfig(format!("{rows}x{cols} matrix is too large"))
        })?;
    len_u32(len, "matrix data")?;
    Ok(len)
}

fn write_tag(buf: &mut Vec<u8>, data_type: u32, len: u32) {
    buf.extend_from_slice(&data_type.to_le_bytes());
    buf.extend_from_slice(&len.to_le_bytes());
}

fn write_header(buf: &mut Vec<u8>) {
    let text = format!(
        "MATLAB 5.0 MAT-file, Platform: {}, Created on: {}",
        std::env::consts::OS,
        Utc::now().format("%a %b %e %H:%M:%S %Y")
    );
    let mut header = [b' '; HEADER_TEXT_LEN];
    let n = text.len().min(HEADER_TEXT_LEN);
    header[..n].copy_from_slice(&text.as_bytes()[..n]);

    buf.extend_from_slice(&header);
    // subsystem data offset: unused
    buf.extend_from_slice(&[0u8; 8]);
    buf.extend_from_slice(&MAT_VERSION.to_le_bytes());
    buf.extend_from_slice(b"IM");
}

/// Encode one named matrix as a `miMATRIX` element
fn encode_matrix(name: &str, matrix: &Array2<f64>) -> Result<Vec<u8>> {
    if name.is_empty() || !name.is_ascii() {
        return Err(PipelineError::InvalidConfig(format!(
            "invalid MAT variable name {name:?}"
        )));
    }

    let (rows, cols) = matrix.dim();
    let to_i32 = |n: usize| {
        i32::try_from(n).map_err(|_| {
            PipelineError::InvalidConfig(format!("matrix {name} dimension {n} too large"))
        })
    };
    let (rows_i32, cols_i32) = (to_i32(rows)?, to_i32(cols)?);

    let name_len = name.len();
    let name_len_u32 = len_u32(name_len, "variable name")?;
    let data_len = data_byte_len(rows, cols)?;
    let body_len = (16 + 16 + 8 + padded(name_len) + 8)
        .checked_add(data_len)
        .ok_or_else(|| PipelineError::InvalidConfig(format!("matrix {name} is too large")))?;
    let body_len_u32 = len_u32(body_len, "matrix element")?;

    let mut buf = Vec::with_capacity(8 + body_len);
    write_tag(&mut buf, MI_MATRIX, body_len_u32);

    // array flags
    write_tag(&mut buf, MI_UINT32, 8);
    buf.extend_from_slice(&MX_DOUBLE_CLASS.to_le_bytes());
    buf.extend_from_slice(&0u32.to_le_bytes());

    // dimensions
    write_tag(&mut buf, MI_INT32, 8);
    buf.extend_from_slice(&rows_i32.to_le_bytes());
    buf.extend_from_slice(&cols_i32.to_le_bytes());

    // array name
    write_tag(&mut buf, MI_INT8, name_len_u32);
    buf.extend_from_slice(name.as_bytes());
    buf.resize(buf.len() + padded(name_len) - name_len, 0);

    // real part, column-major
    write_tag(&mut buf, MI_DOUBLE, len_u32(data_len, "matrix data")?);
    for value in matrix.t().iter() {
        buf.extend_from_slice(&value.to_le_bytes());
    }

    Ok(buf)
}

/// Write named matrices to a MAT-file, creating the parent directory if needed
pub fn write_mat(path: &Path, variables: &[(&str, &Array2<f64>)]) -> Result<()> {
    let mut buf = Vec::new();
    write_header(&mut buf);
    for (name, matrix) in variables {
        buf.extend_from_slice(&encode_matrix(name, matrix)?);
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(File::create(path)?);
    writer.write_all(&buf)?;
    writer.flush()?;

    Ok(())
}
