//! CRC-32 codec and sidecar framing for request/response integrity.
//!
//! Grounded on `_crc32`/`_crcAdd`/`_crcError` in `n_request.c`. The
//! half-byte lookup table below is the standard reflected CRC-32 table
//! (polynomial `0xEDB88320`) collapsed to 16 entries, exactly as used
//! there; this is what makes the sidecar bit-compatible with device
//! firmware.

/// Half-byte (nibble) CRC-32 lookup table, reflected polynomial
/// `0xEDB88320`.
const CRC32_TABLE: [u32; 16] = [
    0x0000_0000,
    0x1DB7_1064,
    0x3B6E_20C8,
    0x26D9_30AC,
    0x76DC_4190,
    0x6B6B_51F4,
    0x4DB2_6158,
    0x5005_713C,
    0xEDB8_8320,
    0xF00F_9344,
    0xD6D6_A3E8,
    0xCB61_B38C,
    0x9B64_C2B0,
    0x86D3_D2D4,
    0xA00A_E278,
    0xBDBD_F21C,
];

/// Reflected CRC-32 over `data`, initial value `0xFFFFFFFF`, final XOR
/// `0xFFFFFFFF`. Processes each byte as two nibbles through the half-byte
/// table, low nibble first.
pub fn crc32(data: &[u8]) -> u32 {
    let mut crc: u32 = 0xFFFF_FFFF;
    for &byte in data {
        crc = CRC32_TABLE[((crc ^ byte as u32) & 0x0F) as usize] ^ (crc >> 4);
        crc = CRC32_TABLE[((crc ^ (byte as u32 >> 4)) & 0x0F) as usize] ^ (crc >> 4);
    }
    crc ^ 0xFFFF_FFFF
}

/// Fixed length of the CRC sidecar field, including its leading separator
/// character (`,` or ` `).
pub const CRC_SIDECAR_LEN: usize = 22;

/// Appends a CRC sidecar to a serialized JSON request.
///
/// `json` must end in `}`; the CRC is computed over `json` as given
/// (before the sidecar is appended). Returns `None` if `json` does not end
/// in `}` (mirrors `_crcAdd` returning `NULL` on malformed input).
pub fn crc_add(json: &str, seqno: u16) -> Option<String> {
    if !json.ends_with('}') {
        return None;
    }
    let body = &json[..json.len() - 1];
    let crc = crc32(json.as_bytes());
    let separator = if body.trim_end().ends_with('{') { ' ' } else { ',' };
    let mut out = String::with_capacity(json.len() + CRC_SIDECAR_LEN);
    out.push_str(body);
    out.push(separator);
    out.push_str(&format!("\"crc\":\"{seqno:04X}:{crc:08X}\""));
    out.push('}');
    Some(out)
}

/// Outcome of validating and stripping a response's CRC sidecar.
#[derive(Debug, PartialEq, Eq)]
pub enum CrcCheck {
    /// No sidecar was present and none has ever been seen on this link;
    /// firmware predating CRC support is assumed. Not an error.
    NoSidecarYet,
    /// The response carried a well-formed sidecar that matches both the
    /// expected sequence number and the recomputed CRC.
    Ok,
    /// The response carried a well-formed sidecar that does *not* match,
    /// or no sidecar was present even though CRC support was previously
    /// observed on this link.
    Mismatch,
}

/// Locates and strips a well-formed `,"crc":"SSSS:CCCCCCCC"` (or leading
/// space variant) sidecar immediately before the final `}` of `json`.
///
/// Returns the parsed `(seqno, crc)` and the byte range of the sidecar
/// (including its separator) if one was found.
fn find_sidecar(json: &str) -> Option<(u16, u32, std::ops::Range<usize>)> {
    let trimmed = json.trim_end();
    if !trimmed.ends_with('}') {
        return None;
    }
    let needle = "\"crc\":\"";
    let before_brace = &trimmed[..trimmed.len() - 1];
    let start = before_brace.rfind(needle)?;
    let rest = &before_brace[start + needle.len()..];
    let end_quote = rest.find('"')?;
    let field = &rest[..end_quote];
    let (seq_hex, crc_hex) = field.split_once(':')?;
    let seqno = u16::from_str_radix(seq_hex, 16).ok()?;
    let crc = u32::from_str_radix(crc_hex, 16).ok()?;
    // Include the separator character (`,` or ` `) immediately before the field.
    let sep_start = if start > 0 { start - 1 } else { start };
    let range = sep_start..(start + needle.len() + end_quote + 1);
    Some((seqno, crc, range))
}

/// Validates and strips the CRC sidecar from a response, mirroring
/// `_crcError`.
///
/// `json` is mutated in place to have its sidecar removed regardless of
/// outcome (the closing `}` is restored). `firmware_supports_crc` is the
/// process-wide sticky flag from spec §4.5: once a sidecar has been seen
/// on this link, its absence thereafter is treated as a mismatch rather
/// than silently tolerated.
pub fn crc_strip_and_check(
    json: &mut String,
    expected_seqno: u16,
    firmware_supports_crc: &mut bool,
) -> CrcCheck {
    if let Some(trailing_ws) = json.len().checked_sub(json.trim_end().len()) {
        if trailing_ws > 0 {
            json.truncate(json.trim_end().len());
        }
    }

    // The device does not CRC error responses; an `err` field short-circuits
    // to "no error" regardless of sidecar state.
    if let Ok(parsed) = serde_json::from_str::<serde_json::Value>(json) {
        if parsed.get("err").and_then(|v| v.as_str()).is_some_and(|s| !s.is_empty()) {
            return CrcCheck::NoSidecarYet;
        }
    }

    match find_sidecar(json) {
        Some((seqno, crc, range)) => {
            *firmware_supports_crc = true;
            let without_sidecar = {
                let mut s = json.clone();
                s.replace_range(range.clone(), "");
                s
            };
            json.replace_range(range, "");
            let recomputed = crc32(without_sidecar.as_bytes());
            if seqno != expected_seqno || crc != recomputed {
                CrcCheck::Mismatch
            } else {
                CrcCheck::Ok
            }
        }
        None => {
            if *firmware_supports_crc {
                CrcCheck::Mismatch
            } else {
                CrcCheck::NoSidecarYet
            }
        }
    }
}
