//! Display formatting for decoded values.
//!
//! [`resolve`] is a pure function from `(ifd, tag, value)` to a
//! `(name, display value)` pair. A handful of well-known tags get a
//! unit-aware or enumerated rendering; everything else, and any well-known
//! tag whose value has an unexpected shape, falls back to the generic
//! rendering:
//!
//! | Type | Rendering |
//! |---|---|
//! | ASCII | NUL-trimmed text, invalid UTF-8 replaced with `U+FFFD` |
//! | RATIONAL / SRATIONAL | `n/d`, or `undefined` when `d == 0` |
//! | integer and float types | comma-joined list |
//! | UNDEFINED | hex dump, capped at [`HEX_DUMP_LIMIT`] bytes |

use super::ifd::{IfdKind, Value};
use super::tags;

/// Bytes shown before a hex dump is cut off.
pub const HEX_DUMP_LIMIT: usize = 64;

const UNDEFINED: &str = "undefined";

/// Resolve a field's display name and display value.
pub fn resolve(ifd: IfdKind, tag: u16, value: &Value) -> (String, String) {
    (tags::tag_name(ifd, tag), format_value(ifd, tag, value))
}

pub fn format_value(ifd: IfdKind, tag: u16, value: &Value) -> String {
    format_known(ifd, tag, value).unwrap_or_else(|| format_generic(value))
}

// ---------------------------------------------------------------------------
// Tag-specific renderings
// ---------------------------------------------------------------------------

const ORIENTATION: &[(u32, &str)] = &[
    (1, "normal"),
    (2, "mirrored horizontally"),
    (3, "rotated 180"),
    (4, "mirrored vertically"),
    (5, "mirrored horizontally, rotated 270 CW"),
    (6, "rotated 90 CW"),
    (7, "mirrored horizontally, rotated 90 CW"),
    (8, "rotated 270 CW"),
];

const RESOLUTION_UNIT: &[(u32, &str)] = &[(1, "none"), (2, "inch"), (3, "cm")];

const COMPRESSION: &[(u32, &str)] = &[
    (1, "uncompressed"),
    (5, "LZW"),
    (6, "JPEG (old-style)"),
    (7, "JPEG"),
    (8, "Deflate"),
    (32773, "PackBits"),
];

const YCBCR_POSITIONING: &[(u32, &str)] = &[(1, "centered"), (2, "co-sited")];

const EXPOSURE_PROGRAM: &[(u32, &str)] = &[
    (0, "not defined"),
    (1, "manual"),
    (2, "normal program"),
    (3, "aperture priority"),
    (4, "shutter priority"),
    (5, "creative program"),
    (6, "action program"),
    (7, "portrait mode"),
    (8, "landscape mode"),
];

const METERING_MODE: &[(u32, &str)] = &[
    (0, "unknown"),
    (1, "average"),
    (2, "center-weighted average"),
    (3, "spot"),
    (4, "multi-spot"),
    (5, "pattern"),
    (6, "partial"),
    (255, "other"),
];

const LIGHT_SOURCE: &[(u32, &str)] = &[
    (0, "unknown"),
    (1, "daylight"),
    (2, "fluorescent"),
    (3, "tungsten"),
    (4, "flash"),
    (9, "fine weather"),
    (10, "cloudy weather"),
    (11, "shade"),
    (17, "standard light A"),
    (18, "standard light B"),
    (19, "standard light C"),
    (20, "D55"),
    (21, "D65"),
    (22, "D75"),
    (23, "D50"),
    (24, "ISO studio tungsten"),
    (255, "other"),
];

const COLOR_SPACE: &[(u32, &str)] = &[(1, "sRGB"), (0xFFFF, "uncalibrated")];

const SENSING_METHOD: &[(u32, &str)] = &[
    (1, "not defined"),
    (2, "one-chip color area sensor"),
    (3, "two-chip color area sensor"),
    (4, "three-chip color area sensor"),
    (5, "color sequential area sensor"),
    (7, "trilinear sensor"),
    (8, "color sequential linear sensor"),
];

const EXPOSURE_MODE: &[(u32, &str)] = &[(0, "auto"), (1, "manual"), (2, "auto bracket")];

const WHITE_BALANCE: &[(u32, &str)] = &[(0, "auto"), (1, "manual")];

const SCENE_CAPTURE_TYPE: &[(u32, &str)] = &[
    (0, "standard"),
    (1, "landscape"),
    (2, "portrait"),
    (3, "night scene"),
];

const GAIN_CONTROL: &[(u32, &str)] = &[
    (0, "none"),
    (1, "low gain up"),
    (2, "high gain up"),
    (3, "low gain down"),
    (4, "high gain down"),
];

const LOW_HIGH: &[(u32, &str)] = &[(0, "normal"), (1, "low"), (2, "high")];

const SHARPNESS: &[(u32, &str)] = &[(0, "normal"), (1, "soft"), (2, "hard")];

const ALTITUDE_REF: &[(u32, &str)] = &[(0, "above sea level"), (1, "below sea level")];

fn format_known(ifd: IfdKind, tag: u16, value: &Value) -> Option<String> {
    use IfdKind::*;
    match (ifd, tag) {
        (Primary | Thumbnail, 0x0103) => enumerated(value, COMPRESSION),
        (Primary | Thumbnail, 0x0112) => enumerated(value, ORIENTATION),
        (Primary | Thumbnail, 0x0128) | (Exif, 0xA210) => enumerated(value, RESOLUTION_UNIT),
        (Primary | Thumbnail, 0x0132) | (Exif, 0x9003 | 0x9004) => {
            ascii_text(value).map(|s| normalize_date(&s))
        }
        (Primary | Thumbnail, 0x0213) => enumerated(value, YCBCR_POSITIONING),

        (Exif, 0x829A) => single_rational(value).map(|(n, d)| format!("{n}/{d} s")),
        (Exif, 0x829D) => single_decimal(value).map(|f| format!("f/{}", decimal(f))),
        (Exif, 0x8822) => enumerated(value, EXPOSURE_PROGRAM),
        (Exif, 0x9000 | 0xA000) | (Interop, 0x0002) => version(value),
        (Exif, 0x9101) => components(value),
        (Exif, 0x9204) => single_decimal(value).map(|f| format!("{} EV", decimal(f))),
        (Exif, 0x9207) => enumerated(value, METERING_MODE),
        (Exif, 0x9208) => enumerated(value, LIGHT_SOURCE),
        (Exif, 0x9209) => value.first_uint().map(flash),
        (Exif, 0x920A) => single_decimal(value).map(|f| format!("{} mm", decimal(f))),
        (Exif, 0x9286) => user_comment(value),
        (Exif, 0xA001) => enumerated(value, COLOR_SPACE),
        (Exif, 0xA217) => enumerated(value, SENSING_METHOD),
        (Exif, 0xA402) => enumerated(value, EXPOSURE_MODE),
        (Exif, 0xA403) => enumerated(value, WHITE_BALANCE),
        (Exif, 0xA405) => value.first_uint().map(|mm| format!("{mm} mm")),
        (Exif, 0xA406) => enumerated(value, SCENE_CAPTURE_TYPE),
        (Exif, 0xA407) => enumerated(value, GAIN_CONTROL),
        (Exif, 0xA408 | 0xA409) => enumerated(value, LOW_HIGH),
        (Exif, 0xA40A) => enumerated(value, SHARPNESS),

        (Gps, 0x0000) => match value {
            Value::Byte(v) if !v.is_empty() => Some(join(v.iter(), ".")),
            _ => None,
        },
        (Gps, 0x0002 | 0x0004 | 0x0014 | 0x0016) => degrees_minutes_seconds(value),
        (Gps, 0x0005) => enumerated(value, ALTITUDE_REF),
        (Gps, 0x0006) => single_decimal(value).map(|f| format!("{} m", decimal(f))),
        (Gps, 0x0007) => time_of_day(value),
        (Gps, 0x001D) => ascii_text(value).map(|s| normalize_date(&s)),
        _ => None,
    }
}

fn enumerated(value: &Value, table: &[(u32, &str)]) -> Option<String> {
    let raw = value.first_uint()?;
    table
        .iter()
        .find(|&&(v, _)| v == raw)
        .map(|&(_, name)| name.to_string())
}

/// `YYYY:MM:DD[ HH:MM:SS]` → `YYYY-MM-DD[ HH:MM:SS]`; anything else unchanged.
fn normalize_date(s: &str) -> String {
    let b = s.as_bytes();
    let is_date = b.len() >= 10
        && b[4] == b':'
        && b[7] == b':'
        && b[..10]
            .iter()
            .enumerate()
            .all(|(i, c)| i == 4 || i == 7 || c.is_ascii_digit());
    if is_date {
        format!("{}-{}-{}{}", &s[0..4], &s[5..7], &s[8..10], &s[10..])
    } else {
        s.to_string()
    }
}

fn single_rational(value: &Value) -> Option<(u32, u32)> {
    match value {
        Value::Rational(v) if v.len() == 1 && v[0].1 != 0 => Some(v[0]),
        _ => None,
    }
}

fn single_decimal(value: &Value) -> Option<f64> {
    match value {
        Value::Rational(v) if v.len() == 1 && v[0].1 != 0 => {
            Some(f64::from(v[0].0) / f64::from(v[0].1))
        }
        Value::SRational(v) if v.len() == 1 && v[0].1 != 0 => {
            Some(f64::from(v[0].0) / f64::from(v[0].1))
        }
        _ => None,
    }
}

/// Up to two decimals, trailing zeros dropped.
fn decimal(f: f64) -> String {
    let s = format!("{f:.2}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" { "0".to_string() } else { s.to_string() }
}

fn rationals_as_f64(value: &Value, n: usize) -> Option<Vec<f64>> {
    match value {
        Value::Rational(v) if v.len() == n && v.iter().all(|&(_, d)| d != 0) => Some(
            v.iter()
                .map(|&(n, d)| f64::from(n) / f64::from(d))
                .collect(),
        ),
        _ => None,
    }
}

fn degrees_minutes_seconds(value: &Value) -> Option<String> {
    let v = rationals_as_f64(value, 3)?;
    Some(format!(
        "{} deg {} min {} sec",
        decimal(v[0]),
        decimal(v[1]),
        decimal(v[2])
    ))
}

fn time_of_day(value: &Value) -> Option<String> {
    let v = rationals_as_f64(value, 3)?;
    let seconds = if v[2].fract() == 0.0 {
        format!("{:02}", v[2] as u32)
    } else {
        format!("{:05.2}", v[2])
    };
    Some(format!("{:02}:{:02}:{}", v[0] as u32, v[1] as u32, seconds))
}

/// Four ASCII digits `MMmm` → `M.mm`, e.g. `0232` → `2.32`.
fn version(value: &Value) -> Option<String> {
    let bytes = match value {
        Value::Undefined(b) | Value::Byte(b) | Value::Ascii(b) => b,
        _ => return None,
    };
    if bytes.len() != 4 || !bytes.iter().all(u8::is_ascii_digit) {
        return None;
    }
    let major = u32::from(bytes[0] - b'0') * 10 + u32::from(bytes[1] - b'0');
    Some(format!("{}.{}{}", major, bytes[2] as char, bytes[3] as char))
}

fn components(value: &Value) -> Option<String> {
    let Value::Undefined(bytes) = value else {
        return None;
    };
    let mut out = String::new();
    for &b in bytes {
        out.push_str(match b {
            0 => "",
            1 => "Y",
            2 => "Cb",
            3 => "Cr",
            4 => "R",
            5 => "G",
            6 => "B",
            _ => return None,
        });
    }
    Some(out)
}

fn flash(raw: u32) -> String {
    let mut parts = vec![if raw & 0x01 != 0 { "fired" } else { "not fired" }];
    match (raw >> 3) & 0x03 {
        1 => parts.push("compulsory flash firing"),
        2 => parts.push("compulsory flash suppression"),
        3 => parts.push("auto mode"),
        _ => {}
    }
    match (raw >> 1) & 0x03 {
        2 => parts.push("return light not detected"),
        3 => parts.push("return light detected"),
        _ => {}
    }
    if raw & 0x20 != 0 {
        parts.push("no flash function");
    }
    if raw & 0x40 != 0 {
        parts.push("red-eye reduction");
    }
    parts.join(", ")
}

/// UserComment carries an 8-byte character code before the text.
fn user_comment(value: &Value) -> Option<String> {
    let Value::Undefined(bytes) = value else {
        return None;
    };
    if bytes.len() < 8 {
        return None;
    }
    let (code, text) = bytes.split_at(8);
    let decoded = match code {
        b"ASCII\0\0\0" | [0, 0, 0, 0, 0, 0, 0, 0] => String::from_utf8_lossy(text).into_owned(),
        b"UNICODE\0" => decode_utf16(text),
        _ => return None,
    };
    Some(
        decoded
            .trim_end_matches(|c: char| c == '\0' || c.is_whitespace())
            .to_string(),
    )
}

/// UTF-16 with no BOM; byte order guessed from which half of each unit is
/// mostly zero, which holds for Latin text.
fn decode_utf16(bytes: &[u8]) -> String {
    let even_zeros = bytes.iter().step_by(2).filter(|&&b| b == 0).count();
    let odd_zeros = bytes.iter().skip(1).step_by(2).filter(|&&b| b == 0).count();
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|c| {
            if even_zeros > odd_zeros {
                u16::from_be_bytes([c[0], c[1]])
            } else {
                u16::from_le_bytes([c[0], c[1]])
            }
        })
        .collect();
    String::from_utf16_lossy(&units)
}

// ---------------------------------------------------------------------------
// Generic renderings
// ---------------------------------------------------------------------------

fn format_generic(value: &Value) -> String {
    match value {
        Value::Ascii(bytes) => ascii(bytes),
        Value::Byte(v) => join(v.iter(), ", "),
        Value::Short(v) => join(v.iter(), ", "),
        Value::Long(v) => join(v.iter(), ", "),
        Value::SByte(v) => join(v.iter(), ", "),
        Value::SShort(v) => join(v.iter(), ", "),
        Value::SLong(v) => join(v.iter(), ", "),
        Value::Float(v) => join(v.iter(), ", "),
        Value::Double(v) => join(v.iter(), ", "),
        Value::Rational(v) => v
            .iter()
            .map(|&(n, d)| rational(n, d))
            .collect::<Vec<_>>()
            .join(", "),
        Value::SRational(v) => v
            .iter()
            .map(|&(n, d)| rational(n, d))
            .collect::<Vec<_>>()
            .join(", "),
        Value::Undefined(bytes) => hex_dump(bytes),
        Value::Unknown { type_id, count } => format!("unknown type {type_id} ({count} values)"),
    }
}

fn ascii_text(value: &Value) -> Option<String> {
    match value {
        Value::Ascii(bytes) => Some(ascii(bytes)),
        _ => None,
    }
}

/// NUL-separated strings, lossily decoded and comma-joined.
fn ascii(bytes: &[u8]) -> String {
    bytes
        .split(|&b| b == 0)
        .filter(|s| !s.is_empty())
        .map(|s| String::from_utf8_lossy(s).trim_end().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn rational<T: std::fmt::Display + Default + PartialEq>(n: T, d: T) -> String {
    if d == T::default() {
        UNDEFINED.to_string()
    } else {
        format!("{n}/{d}")
    }
}

fn join<T: std::fmt::Display>(items: impl Iterator<Item = T>, sep: &str) -> String {
    items.map(|x| x.to_string()).collect::<Vec<_>>().join(sep)
}

fn hex_dump(bytes: &[u8]) -> String {
    let shown = bytes
        .iter()
        .take(HEX_DUMP_LIMIT)
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(" ");
    if bytes.len() > HEX_DUMP_LIMIT {
        format!("{shown} ... ({} bytes)", bytes.len())
    } else {
        shown
    }
}
