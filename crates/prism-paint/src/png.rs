//! PNG encoding for generated textures.

use crate::error::{PaintError, Result};
use miniz_oxide::deflate::compress_to_vec_zlib;

/// PNG file signature.
const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

/// zlib compression level used for IDAT.
const COMPRESSION_LEVEL: u8 = 6;

/// Encode raw RGBA pixels as PNG.
pub fn encode_png(pixels: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    if width == 0 || height == 0 {
        return Err(PaintError::InvalidSize);
    }
    let row_size = width as usize * 4;
    if pixels.len() != row_size * height as usize {
        return Err(PaintError::Png(format!(
            "expected {} bytes of RGBA data, got {}",
            row_size * height as usize,
            pixels.len()
        )));
    }

    let mut output = Vec::new();
    output.extend_from_slice(&PNG_SIGNATURE);

    let mut ihdr = Vec::with_capacity(13);
    ihdr.extend_from_slice(&width.to_be_bytes());
    ihdr.extend_from_slice(&height.to_be_bytes());
    ihdr.push(8); // Bit depth
    ihdr.push(6); // Color type: RGBA
    ihdr.push(0); // Compression method
    ihdr.push(0); // Filter method
    ihdr.push(0); // Interlace method
    write_chunk(&mut output, b"IHDR", &ihdr);

    // Every scanline gets filter type 0
    let mut raw = Vec::with_capacity(height as usize * (row_size + 1));
    for row in pixels.chunks_exact(row_size) {
        raw.push(0);
        raw.extend_from_slice(row);
    }

    let compressed = compress_to_vec_zlib(&raw, COMPRESSION_LEVEL);
    write_chunk(&mut output, b"IDAT", &compressed);
    write_chunk(&mut output, b"IEND", &[]);

    Ok(output)
}

fn write_chunk(output: &mut Vec<u8>, chunk_type: &[u8; 4], data: &[u8]) {
    output.extend_from_slice(&(data.len() as u32).to_be_bytes());
    output.extend_from_slice(chunk_type);
    output.extend_from_slice(data);
    let mut crc = crc32_update(0xFFFF_FFFF, chunk_type);
    crc = crc32_update(crc, data);
    output.extend_from_slice(&(crc ^ 0xFFFF_FFFF).to_be_bytes());
}

fn crc32_update(mut crc: u32, data: &[u8]) -> u32 {
    for byte in data {
        let index = ((crc ^ *byte as u32) & 0xFF) as usize;
        crc = CRC_TABLE[index] ^ (crc >> 8);
    }
    crc
}

#[cfg(test)]
fn crc32(data: &[u8]) -> u32 {
    crc32_update(0xFFFF_FFFF, data) ^ 0xFFFF_FFFF
}

static CRC_TABLE: [u32; 256] = build_crc_table();

const fn build_crc_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut n = 0;
    while n < 256 {
        let mut c = n as u32;
        let mut k = 0;
        while k < 8 {
            c = if c & 1 != 0 { 0xEDB8_8320 ^ (c >> 1) } else { c >> 1 };
            k += 1;
        }
        table[n] = c;
        n += 1;
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use miniz_oxide::inflate::decompress_to_vec_zlib;

    #[test]
    fn test_crc32() {
        assert_eq!(crc32(b"123456789"), 0xCBF43926);
    }

    #[test]
    fn test_png_layout() {
        let pixels = vec![255u8; 2 * 2 * 4];
        let png = encode_png(&pixels, 2, 2).unwrap();

        assert_eq!(&png[0..8], &PNG_SIGNATURE);
        assert_eq!(&png[12..16], b"IHDR");
        assert_eq!(u32::from_be_bytes([png[16], png[17], png[18], png[19]]), 2);
        assert!(png.ends_with(&[0xAE, 0x42, 0x60, 0x82]));
    }

    #[test]
    fn test_idat_inflates_to_filtered_rows() {
        let pixels: Vec<u8> = (0..16).collect();
        let png = encode_png(&pixels, 2, 2).unwrap();

        // IHDR chunk is 25 bytes after the signature
        let idat_start = 8 + 25;
        let len = u32::from_be_bytes([
            png[idat_start],
            png[idat_start + 1],
            png[idat_start + 2],
            png[idat_start + 3],
        ]) as usize;
        assert_eq!(&png[idat_start + 4..idat_start + 8], b"IDAT");
        let data = &png[idat_start + 8..idat_start + 8 + len];
        let raw = decompress_to_vec_zlib(data).unwrap();

        assert_eq!(raw.len(), 2 * (1 + 8));
        assert_eq!(raw[0], 0);
        assert_eq!(&raw[1..9], &pixels[0..8]);
        assert_eq!(raw[9], 0);
        assert_eq!(&raw[10..18], &pixels[8..16]);
    }

    #[test]
    fn test_rejects_mismatched_buffer() {
        assert!(encode_png(&[0; 7], 1, 2).is_err());
        assert_eq!(encode_png(&[], 0, 0), Err(PaintError::InvalidSize));
    }
}
