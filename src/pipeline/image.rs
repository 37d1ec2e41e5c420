// src/pipeline/image.rs

//! Lossless image optimisation.
//!
//! PNG files are rewritten without their textual and timestamp ancillary
//! chunks (`tEXt`, `zTXt`, `iTXt`, `tIME`). Pixel data is never touched.
//! Anything that is not a PNG is returned unchanged.

use anyhow::{Result, bail};
use tracing::trace;

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

const DROPPED_CHUNKS: [&[u8; 4]; 4] = [b"tEXt", b"zTXt", b"iTXt", b"tIME"];

pub fn is_png(data: &[u8]) -> bool {
    data.starts_with(&PNG_SIGNATURE)
}

/// Strip metadata chunks from a PNG; pass other formats through.
///
/// Fails on a PNG whose chunk stream is truncated or lacks `IEND`.
pub fn optimize_image(data: &[u8]) -> Result<Vec<u8>> {
    if !is_png(data) {
        return Ok(data.to_vec());
    }

    let mut out = Vec::with_capacity(data.len());
    out.extend_from_slice(&PNG_SIGNATURE);

    let mut pos = PNG_SIGNATURE.len();
    loop {
        // length (4) + type (4) + data (length) + crc (4)
        if data.len() < pos + 8 {
            bail!("truncated PNG: chunk header at offset {pos} is incomplete");
        }
        let len = u32::from_be_bytes([data[pos], data[pos + 1], data[pos + 2], data[pos + 3]]) as usize;
        let kind = &data[pos + 4..pos + 8];
        let end = pos + 12 + len;
        if data.len() < end {
            bail!(
                "truncated PNG: chunk '{}' at offset {pos} needs {len} bytes",
                String::from_utf8_lossy(kind)
            );
        }

        if DROPPED_CHUNKS.iter().any(|d| d.as_slice() == kind) {
            trace!(chunk = %String::from_utf8_lossy(kind), len, "dropping PNG chunk");
        } else {
            out.extend_from_slice(&data[pos..end]);
        }

        if kind == b"IEND" {
            return Ok(out);
        }
        pos = end;
        if pos == data.len() {
            bail!("invalid PNG: missing IEND chunk");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // CRC values are not checked by the optimiser, so zeros are fine here.
    fn chunk(kind: &[u8; 4], body: &[u8]) -> Vec<u8> {
        let mut c = (body.len() as u32).to_be_bytes().to_vec();
        c.extend_from_slice(kind);
        c.extend_from_slice(body);
        c.extend_from_slice(&[0, 0, 0, 0]);
        c
    }

    fn png(chunks: &[Vec<u8>]) -> Vec<u8> {
        let mut data = PNG_SIGNATURE.to_vec();
        for c in chunks {
            data.extend_from_slice(c);
        }
        data
    }

    #[test]
    fn drops_text_and_time_chunks_only() {
        let ihdr = chunk(b"IHDR", &[0; 13]);
        let idat = chunk(b"IDAT", b"pixels");
        let iend = chunk(b"IEND", b"");
        let input = png(&[
            ihdr.clone(),
            chunk(b"tEXt", b"Software\0editor"),
            chunk(b"tIME", &[0; 7]),
            idat.clone(),
            chunk(b"iTXt", b"x"),
            iend.clone(),
        ]);

        let out = optimize_image(&input).unwrap();
        assert_eq!(out, png(&[ihdr, idat, iend]));
        assert!(out.len() < input.len());
    }

    #[test]
    fn non_png_passes_through() {
        let gif = b"GIF89a....".to_vec();
        assert_eq!(optimize_image(&gif).unwrap(), gif);
        assert!(optimize_image(b"").unwrap().is_empty());
    }

    #[test]
    fn truncated_or_unterminated_png_is_an_error() {
        let mut truncated = png(&[chunk(b"IHDR", &[0; 13])]);
        truncated.truncate(truncated.len() - 3);
        let err = optimize_image(&truncated).unwrap_err();
        assert!(err.to_string().contains("truncated PNG"));

        let no_end = png(&[chunk(b"IHDR", &[0; 13]), chunk(b"IDAT", b"p")]);
        let err = optimize_image(&no_end).unwrap_err();
        assert!(err.to_string().contains("missing IEND"));
    }
}
