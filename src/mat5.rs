//! Level 5 MAT-file container codec.
//!
//! All byte-level concerns live here. The format is a 128-byte header
//! followed by tagged data elements aligned to 8-byte boundaries:
//!
//! ```text
//! Offset  Size  Field
//! ------  ----  -----
//! 0       116   Descriptive text
//! 116     8     Subsystem data offset (unused, zero)
//! 124     2     Version (0x0100)
//! 126     2     Endian indicator ("IM" when little-endian)
//! 128     ...   Data elements: u32 type, u32 byte count, payload, padding
//! ```
//!
//! Elements with payloads of four bytes or fewer may use the small element
//! format (type and count packed into the first word). `miCOMPRESSED`
//! elements hold one zlib-deflated element and are supported on the read
//! path only. Numeric data stored as any integer or float type is widened
//! to f64; char data is kept as UTF-16 code units, one unit per grid cell.
//!
//! Only little-endian containers are read or written. Arrays of classes
//! this toolkit cannot convert (struct, sparse, object, function handle)
//! still parse structurally into [`RawArray::Other`] so the loader can
//! reject them by name.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use flate2::read::{GzDecoder, ZlibDecoder};

use crate::error::{ConvertError, Result};

pub const HEADER_LEN: usize = 128;
const HEADER_TEXT: &str = "MATLAB 5.0 MAT-file, created by mat-tabular";
const VERSION: u16 = 0x0100;

/// Secondary extension marking gzip-compressed containers.
pub const GZIP_EXTENSION: &str = "gz";

// Data element types.
const MI_INT8: u32 = 1;
const MI_UINT8: u32 = 2;
const MI_INT16: u32 = 3;
const MI_UINT16: u32 = 4;
const MI_INT32: u32 = 5;
const MI_UINT32: u32 = 6;
const MI_SINGLE: u32 = 7;
const MI_DOUBLE: u32 = 9;
const MI_INT64: u32 = 12;
const MI_UINT64: u32 = 13;
const MI_MATRIX: u32 = 14;
const MI_COMPRESSED: u32 = 15;
const MI_UTF8: u32 = 16;
const MI_UTF16: u32 = 17;

// Array classes.
const MX_CELL: u8 = 1;
const MX_CHAR: u8 = 4;
const MX_DOUBLE: u8 = 6;
const MX_UINT64: u8 = 15;

/// A named array stored in a container.
#[derive(Debug, Clone, PartialEq)]
pub struct MatEntry {
    pub name: String,
    pub array: RawArray,
}

/// Closed tagged union over the array kinds the decoder dispatches on.
#[derive(Debug, Clone, PartialEq)]
pub enum RawArray {
    Matrix(NumericArray),
    Char(CharArray),
    Cell(CellArray),
    Other { dims: Vec<usize>, class: String },
}

impl RawArray {
    pub fn dims(&self) -> &[usize] {
        match self {
            RawArray::Matrix(a) => &a.dims,
            RawArray::Char(a) => &a.dims,
            RawArray::Cell(a) => &a.dims,
            RawArray::Other { dims, .. } => dims,
        }
    }

    pub fn num_dims(&self) -> usize {
        self.dims().len()
    }

    pub fn rows(&self) -> usize {
        self.dims().first().copied().unwrap_or(0)
    }

    pub fn cols(&self) -> usize {
        self.dims().get(1).copied().unwrap_or(0)
    }

    pub fn class_name(&self) -> &str {
        match self {
            RawArray::Matrix(_) => "double",
            RawArray::Char(_) => "char",
            RawArray::Cell(_) => "cell",
            RawArray::Other { class, .. } => class,
        }
    }
}

/// Numeric matrix, values widened to f64, column-major.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericArray {
    pub dims: Vec<usize>,
    pub values: Vec<f64>,
}

impl NumericArray {
    pub fn scalar(value: f64) -> Self {
        Self {
            dims: vec![1, 1],
            values: vec![value],
        }
    }

    pub fn from_rows(rows: Vec<Vec<f64>>) -> Self {
        let nrows = rows.len();
        let ncols = rows.first().map_or(0, Vec::len);
        let mut values = vec![0.0; nrows * ncols];
        for (r, row) in rows.iter().enumerate() {
            for (c, v) in row.iter().enumerate() {
                values[c * nrows + r] = *v;
            }
        }
        Self {
            dims: vec![nrows, ncols],
            values,
        }
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        let nrows = self.dims.first().copied().unwrap_or(0);
        self.values.get(col * nrows + row).copied()
    }

    pub fn as_scalar(&self) -> Option<f64> {
        if self.values.len() == 1 {
            Some(self.values[0])
        } else {
            None
        }
    }
}

/// Char array holding UTF-16 code units, one per grid cell, column-major.
#[derive(Debug, Clone, PartialEq)]
pub struct CharArray {
    pub dims: Vec<usize>,
    pub units: Vec<u16>,
}

impl CharArray {
    pub fn from_str(text: &str) -> Self {
        let units: Vec<u16> = text.encode_utf16().collect();
        Self {
            dims: vec![1, units.len()],
            units,
        }
    }

    pub fn unit(&self, row: usize, col: usize) -> Option<u16> {
        let nrows = self.dims.first().copied().unwrap_or(0);
        self.units.get(col * nrows + row).copied()
    }

    /// Full text in reading order (row by row).
    pub fn text(&self) -> String {
        let nrows = self.dims.first().copied().unwrap_or(0);
        let ncols = self.dims.get(1).copied().unwrap_or(0);
        let mut ordered = Vec::with_capacity(self.units.len());
        for r in 0..nrows {
            for c in 0..ncols {
                if let Some(u) = self.units.get(c * nrows + r) {
                    ordered.push(*u);
                }
            }
        }
        String::from_utf16_lossy(&ordered)
    }
}

/// Cell array, elements column-major.
#[derive(Debug, Clone, PartialEq)]
pub struct CellArray {
    pub dims: Vec<usize>,
    pub elements: Vec<RawArray>,
}

impl CellArray {
    pub fn from_rows(rows: Vec<Vec<RawArray>>) -> Self {
        let nrows = rows.len();
        let ncols = rows.first().map_or(0, Vec::len);
        let mut slots: Vec<Option<RawArray>> = (0..nrows * ncols).map(|_| None).collect();
        for (r, row) in rows.into_iter().enumerate() {
            for (c, el) in row.into_iter().enumerate() {
                slots[c * nrows + r] = Some(el);
            }
        }
        let elements = slots
            .into_iter()
            .map(|slot| slot.expect("rectangular cell grid"))
            .collect();
        Self {
            dims: vec![nrows, ncols],
            elements,
        }
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&RawArray> {
        let nrows = self.dims.first().copied().unwrap_or(0);
        self.elements.get(col * nrows + row)
    }
}

/// An in-memory container: an ordered list of named entries.
#[derive(Debug, Clone, Default)]
pub struct MatContainer {
    pub entries: Vec<MatEntry>,
}

impl MatContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_entry(&mut self, name: impl Into<String>, array: RawArray) {
        self.entries.push(MatEntry {
            name: name.into(),
            array,
        });
    }

    /// Reads a container from disk, transparently gunzipping when the path
    /// carries the `.gz` secondary extension.
    pub fn read_path(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|err| {
            ConvertError::source_unavailable(format!("cannot open {path:?}: {err}"))
        })?;
        let mut bytes = Vec::new();
        if path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(GZIP_EXTENSION))
        {
            GzDecoder::new(file).read_to_end(&mut bytes)?;
        } else {
            let mut file = file;
            file.read_to_end(&mut bytes)?;
        }
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(buf: &[u8]) -> Result<Self> {
        if buf.len() < HEADER_LEN {
            return Err(ConvertError::format("container shorter than header"));
        }
        match &buf[126..128] {
            b"IM" => {}
            b"MI" => {
                return Err(ConvertError::format(
                    "big-endian containers are not supported",
                ));
            }
            _ => return Err(ConvertError::format("missing endian indicator")),
        }

        let mut cursor = Cursor::new(buf);
        cursor.pos = HEADER_LEN;
        let mut entries = Vec::new();
        while let Some(element) = next_element(&mut cursor)? {
            match element.ty {
                MI_MATRIX => entries.push(parse_matrix(element.data)?),
                MI_COMPRESSED => {
                    let inflated = inflate(element.data)?;
                    let mut inner = Cursor::new(&inflated);
                    let Some(element) = next_element(&mut inner)? else {
                        return Err(ConvertError::format("empty compressed element"));
                    };
                    if element.ty != MI_MATRIX {
                        return Err(ConvertError::format(
                            "compressed element does not hold a matrix",
                        ));
                    }
                    entries.push(parse_matrix(element.data)?);
                }
                other => {
                    return Err(ConvertError::format(format!(
                        "unexpected top-level element type {other}"
                    )));
                }
            }
        }
        Ok(Self { entries })
    }

    /// Serializes the whole container to bytes; the caller writes them out
    /// in one operation so a failed encode never leaves a partial file.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        write_header(&mut buf);
        for entry in &self.entries {
            let payload = matrix_payload(&entry.name, &entry.array)?;
            write_element(&mut buf, MI_MATRIX, &payload);
        }
        Ok(buf)
    }
}

struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.pos)
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        if self.remaining() < len {
            return Err(ConvertError::format("truncated container data"));
        }
        let slice = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    fn u32(&mut self) -> Result<u32> {
        let bytes = self.take(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn align8(&mut self) {
        let aligned = (self.pos + 7) & !7;
        self.pos = aligned.min(self.buf.len());
    }
}

struct Element<'a> {
    ty: u32,
    data: &'a [u8],
}

fn next_element<'a>(cursor: &mut Cursor<'a>) -> Result<Option<Element<'a>>> {
    if cursor.remaining() == 0 {
        return Ok(None);
    }
    let head = cursor.u32()?;
    if head >> 16 != 0 {
        // Small element: type and byte count packed into one word.
        let ty = head & 0xFFFF;
        let len = (head >> 16) as usize;
        if len > 4 {
            return Err(ConvertError::format("small element longer than 4 bytes"));
        }
        let data = cursor.take(4)?;
        return Ok(Some(Element {
            ty,
            data: &data[..len],
        }));
    }
    let len = cursor.u32()? as usize;
    let data = cursor.take(len)?;
    cursor.align8();
    Ok(Some(Element { ty: head, data }))
}

fn inflate(data: &[u8]) -> Result<Vec<u8>> {
    let mut inflated = Vec::new();
    ZlibDecoder::new(data)
        .read_to_end(&mut inflated)
        .map_err(|err| ConvertError::format(format!("zlib inflate failed: {err}")))?;
    Ok(inflated)
}

fn parse_matrix(data: &[u8]) -> Result<MatEntry> {
    if data.is_empty() {
        // Some writers encode empty arrays as zero-length matrix elements.
        return Ok(MatEntry {
            name: String::new(),
            array: RawArray::Matrix(NumericArray {
                dims: vec![0, 0],
                values: Vec::new(),
            }),
        });
    }
    let mut cursor = Cursor::new(data);

    let flags = expect_subelement(&mut cursor, "array flags")?;
    if flags.ty != MI_UINT32 || flags.data.len() < 8 {
        return Err(ConvertError::format("malformed array flags"));
    }
    let flag_word = u32::from_le_bytes([flags.data[0], flags.data[1], flags.data[2], flags.data[3]]);
    let class = (flag_word & 0xFF) as u8;

    let dims_elem = expect_subelement(&mut cursor, "dimensions")?;
    if dims_elem.ty != MI_INT32 {
        return Err(ConvertError::format("malformed dimensions element"));
    }
    let mut dims = Vec::with_capacity(dims_elem.data.len() / 4);
    for chunk in dims_elem.data.chunks_exact(4) {
        let dim = i32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        if dim < 0 {
            return Err(ConvertError::format("negative dimension"));
        }
        dims.push(dim as usize);
    }

    let name_elem = expect_subelement(&mut cursor, "array name")?;
    if name_elem.ty != MI_INT8 && name_elem.ty != MI_UINT8 {
        return Err(ConvertError::format("malformed array name element"));
    }
    let name = String::from_utf8_lossy(name_elem.data).into_owned();

    let total: usize = dims.iter().product();
    let array = match class {
        MX_CHAR => {
            let el = expect_subelement(&mut cursor, "char data")?;
            let units = decode_char_units(&el, total)?;
            RawArray::Char(CharArray { dims, units })
        }
        MX_CELL => {
            let mut elements = Vec::with_capacity(total);
            for _ in 0..total {
                let el = expect_subelement(&mut cursor, "cell element")?;
                if el.ty != MI_MATRIX {
                    return Err(ConvertError::format("cell element is not a matrix"));
                }
                elements.push(parse_matrix(el.data)?.array);
            }
            RawArray::Cell(CellArray { dims, elements })
        }
        MX_DOUBLE..=MX_UINT64 => {
            let el = expect_subelement(&mut cursor, "numeric data")?;
            let values = widen_numeric(&el)?;
            if values.len() != total {
                return Err(ConvertError::format("numeric data length mismatch"));
            }
            // An imaginary part may follow for complex arrays; only the
            // real part is converted, matching the reference behavior.
            RawArray::Matrix(NumericArray { dims, values })
        }
        other => RawArray::Other {
            dims,
            class: class_name(other).to_string(),
        },
    };

    Ok(MatEntry { name, array })
}

fn expect_subelement<'a>(cursor: &mut Cursor<'a>, what: &str) -> Result<Element<'a>> {
    next_element(cursor)?.ok_or_else(|| ConvertError::format(format!("missing {what}")))
}

fn widen_numeric(el: &Element<'_>) -> Result<Vec<f64>> {
    let data = el.data;
    let values = match el.ty {
        MI_DOUBLE => data
            .chunks_exact(8)
            .map(|c| f64::from_le_bytes(c.try_into().expect("8-byte chunk")))
            .collect(),
        MI_SINGLE => data
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes(c.try_into().expect("4-byte chunk")) as f64)
            .collect(),
        MI_INT8 => data.iter().map(|&b| b as i8 as f64).collect(),
        MI_UINT8 => data.iter().map(|&b| b as f64).collect(),
        MI_INT16 => data
            .chunks_exact(2)
            .map(|c| i16::from_le_bytes([c[0], c[1]]) as f64)
            .collect(),
        MI_UINT16 => data
            .chunks_exact(2)
            .map(|c| u16::from_le_bytes([c[0], c[1]]) as f64)
            .collect(),
        MI_INT32 => data
            .chunks_exact(4)
            .map(|c| i32::from_le_bytes(c.try_into().expect("4-byte chunk")) as f64)
            .collect(),
        MI_UINT32 => data
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes(c.try_into().expect("4-byte chunk")) as f64)
            .collect(),
        MI_INT64 => data
            .chunks_exact(8)
            .map(|c| i64::from_le_bytes(c.try_into().expect("8-byte chunk")) as f64)
            .collect(),
        MI_UINT64 => data
            .chunks_exact(8)
            .map(|c| u64::from_le_bytes(c.try_into().expect("8-byte chunk")) as f64)
            .collect(),
        other => {
            return Err(ConvertError::format(format!(
                "unsupported numeric storage type {other}"
            )));
        }
    };
    Ok(values)
}

fn decode_char_units(el: &Element<'_>, expected: usize) -> Result<Vec<u16>> {
    match el.ty {
        MI_UINT16 | MI_UTF16 => {
            let units: Vec<u16> = el
                .data
                .chunks_exact(2)
                .map(|c| u16::from_le_bytes([c[0], c[1]]))
                .collect();
            if units.len() != expected {
                return Err(ConvertError::format("char data length mismatch"));
            }
            Ok(units)
        }
        MI_UTF8 | MI_INT8 | MI_UINT8 => {
            Ok(String::from_utf8_lossy(el.data).encode_utf16().collect())
        }
        other => Err(ConvertError::format(format!(
            "unsupported char storage type {other}"
        ))),
    }
}

fn class_name(class: u8) -> &'static str {
    match class {
        1 => "cell",
        2 => "struct",
        3 => "object",
        4 => "char",
        5 => "sparse",
        6 => "double",
        7 => "single",
        8 => "int8",
        9 => "uint8",
        10 => "int16",
        11 => "uint16",
        12 => "int32",
        13 => "uint32",
        14 => "int64",
        15 => "uint64",
        16 => "function handle",
        _ => "unknown",
    }
}

fn write_header(buf: &mut Vec<u8>) {
    let mut text = [b' '; 116];
    let src = HEADER_TEXT.as_bytes();
    text[..src.len()].copy_from_slice(src);
    buf.extend_from_slice(&text);
    buf.extend_from_slice(&[0u8; 8]);
    buf.extend_from_slice(&VERSION.to_le_bytes());
    buf.extend_from_slice(b"IM");
}

fn write_element(buf: &mut Vec<u8>, ty: u32, data: &[u8]) {
    buf.extend_from_slice(&ty.to_le_bytes());
    buf.extend_from_slice(&(data.len() as u32).to_le_bytes());
    buf.extend_from_slice(data);
    let pad = (8 - data.len() % 8) % 8;
    buf.extend(std::iter::repeat_n(0u8, pad));
}

fn matrix_payload(name: &str, array: &RawArray) -> Result<Vec<u8>> {
    let class = match array {
        RawArray::Matrix(_) => MX_DOUBLE,
        RawArray::Char(_) => MX_CHAR,
        RawArray::Cell(_) => MX_CELL,
        RawArray::Other { class, .. } => {
            return Err(ConvertError::format(format!(
                "cannot serialize array class '{class}'"
            )));
        }
    };

    let mut payload = Vec::new();

    let mut flags = [0u8; 8];
    flags[..4].copy_from_slice(&(class as u32).to_le_bytes());
    write_element(&mut payload, MI_UINT32, &flags);

    let mut dim_bytes = Vec::with_capacity(array.dims().len() * 4);
    for &dim in array.dims() {
        dim_bytes.extend_from_slice(&(dim as i32).to_le_bytes());
    }
    write_element(&mut payload, MI_INT32, &dim_bytes);

    write_element(&mut payload, MI_INT8, name.as_bytes());

    match array {
        RawArray::Matrix(matrix) => {
            let mut data = Vec::with_capacity(matrix.values.len() * 8);
            for value in &matrix.values {
                data.extend_from_slice(&value.to_le_bytes());
            }
            write_element(&mut payload, MI_DOUBLE, &data);
        }
        RawArray::Char(chars) => {
            let mut data = Vec::with_capacity(chars.units.len() * 2);
            for unit in &chars.units {
                data.extend_from_slice(&unit.to_le_bytes());
            }
            write_element(&mut payload, MI_UINT16, &data);
        }
        RawArray::Cell(cells) => {
            for element in &cells.elements {
                let nested = matrix_payload("", element)?;
                write_element(&mut payload, MI_MATRIX, &nested);
            }
        }
        RawArray::Other { .. } => unreachable!("rejected above"),
    }

    Ok(payload)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use flate2::Compression;
    use flate2::write::ZlibEncoder;

    use super::*;

    fn round_trip(container: &MatContainer) -> MatContainer {
        let bytes = container.to_bytes().expect("serialize");
        MatContainer::from_bytes(&bytes).expect("parse")
    }

    #[test]
    fn numeric_matrix_round_trips() {
        let mut container = MatContainer::new();
        container.add_entry(
            "m",
            RawArray::Matrix(NumericArray::from_rows(vec![
                vec![1.0, 2.0],
                vec![3.0, 4.0],
                vec![5.0, 6.0],
            ])),
        );
        let parsed = round_trip(&container);
        assert_eq!(parsed.entries.len(), 1);
        assert_eq!(parsed.entries[0].name, "m");
        let RawArray::Matrix(matrix) = &parsed.entries[0].array else {
            panic!("expected matrix");
        };
        assert_eq!(matrix.dims, vec![3, 2]);
        assert_eq!(matrix.get(0, 1), Some(2.0));
        assert_eq!(matrix.get(2, 0), Some(5.0));
    }

    #[test]
    fn char_array_round_trips() {
        let mut container = MatContainer::new();
        container.add_entry("s", RawArray::Char(CharArray::from_str("hello")));
        let parsed = round_trip(&container);
        let RawArray::Char(chars) = &parsed.entries[0].array else {
            panic!("expected char array");
        };
        assert_eq!(chars.dims, vec![1, 5]);
        assert_eq!(chars.text(), "hello");
    }

    #[test]
    fn cell_array_round_trips() {
        let mut container = MatContainer::new();
        container.add_entry(
            "c",
            RawArray::Cell(CellArray::from_rows(vec![
                vec![
                    RawArray::Char(CharArray::from_str("red")),
                    RawArray::Matrix(NumericArray::scalar(1.5)),
                ],
                vec![
                    RawArray::Char(CharArray::from_str("blue")),
                    RawArray::Matrix(NumericArray::scalar(-2.0)),
                ],
            ])),
        );
        let parsed = round_trip(&container);
        let RawArray::Cell(cells) = &parsed.entries[0].array else {
            panic!("expected cell array");
        };
        assert_eq!(cells.dims, vec![2, 2]);
        let RawArray::Char(chars) = cells.get(1, 0).expect("element") else {
            panic!("expected char element");
        };
        assert_eq!(chars.text(), "blue");
        let RawArray::Matrix(matrix) = cells.get(0, 1).expect("element") else {
            panic!("expected scalar element");
        };
        assert_eq!(matrix.as_scalar(), Some(1.5));
    }

    #[test]
    fn multiple_entries_keep_order() {
        let mut container = MatContainer::new();
        container.add_entry("first", RawArray::Matrix(NumericArray::scalar(1.0)));
        container.add_entry("second", RawArray::Char(CharArray::from_str("x")));
        let parsed = round_trip(&container);
        let names: Vec<&str> = parsed.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["first", "second"]);
    }

    #[test]
    fn small_element_format_parses() {
        // 1x1 int8 matrix with a 4-char name, data packed as small elements.
        let mut buf = Vec::new();
        write_header(&mut buf);
        let mut payload = Vec::new();
        let mut flags = [0u8; 8];
        flags[..4].copy_from_slice(&8u32.to_le_bytes()); // int8 class
        write_element(&mut payload, MI_UINT32, &flags);
        let mut dims = Vec::new();
        dims.extend_from_slice(&1i32.to_le_bytes());
        dims.extend_from_slice(&1i32.to_le_bytes());
        write_element(&mut payload, MI_INT32, &dims);
        // Small name element: type miINT8, 4 bytes "tiny".
        payload.extend_from_slice(&((4u32 << 16) | MI_INT8).to_le_bytes());
        payload.extend_from_slice(b"tiny");
        // Small data element: type miINT8, 1 byte.
        payload.extend_from_slice(&((1u32 << 16) | MI_INT8).to_le_bytes());
        payload.extend_from_slice(&[7u8, 0, 0, 0]);
        write_element(&mut buf, MI_MATRIX, &payload);

        let parsed = MatContainer::from_bytes(&buf).expect("parse small elements");
        assert_eq!(parsed.entries[0].name, "tiny");
        let RawArray::Matrix(matrix) = &parsed.entries[0].array else {
            panic!("expected matrix");
        };
        assert_eq!(matrix.values, vec![7.0]);
    }

    #[test]
    fn compressed_element_parses() {
        let mut container = MatContainer::new();
        container.add_entry("z", RawArray::Matrix(NumericArray::scalar(42.0)));
        let plain = container.to_bytes().expect("serialize");

        // Recompress the lone matrix element into a miCOMPRESSED wrapper.
        let element = &plain[HEADER_LEN..];
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(element).expect("deflate");
        let deflated = encoder.finish().expect("finish deflate");

        let mut buf = plain[..HEADER_LEN].to_vec();
        write_element(&mut buf, MI_COMPRESSED, &deflated);

        let parsed = MatContainer::from_bytes(&buf).expect("parse compressed");
        assert_eq!(parsed.entries[0].name, "z");
        let RawArray::Matrix(matrix) = &parsed.entries[0].array else {
            panic!("expected matrix");
        };
        assert_eq!(matrix.as_scalar(), Some(42.0));
    }

    #[test]
    fn integer_storage_widens_to_f64() {
        let mut buf = Vec::new();
        write_header(&mut buf);
        let mut payload = Vec::new();
        let mut flags = [0u8; 8];
        flags[..4].copy_from_slice(&(MX_DOUBLE as u32).to_le_bytes());
        write_element(&mut payload, MI_UINT32, &flags);
        let mut dims = Vec::new();
        dims.extend_from_slice(&1i32.to_le_bytes());
        dims.extend_from_slice(&3i32.to_le_bytes());
        write_element(&mut payload, MI_INT32, &dims);
        write_element(&mut payload, MI_INT8, b"v");
        // Doubles stored compactly as int16.
        let mut data = Vec::new();
        for v in [-1i16, 0, 300] {
            data.extend_from_slice(&v.to_le_bytes());
        }
        write_element(&mut payload, MI_INT16, &data);
        write_element(&mut buf, MI_MATRIX, &payload);

        let parsed = MatContainer::from_bytes(&buf).expect("parse int16 storage");
        let RawArray::Matrix(matrix) = &parsed.entries[0].array else {
            panic!("expected matrix");
        };
        assert_eq!(matrix.values, vec![-1.0, 0.0, 300.0]);
    }

    #[test]
    fn unsupported_class_parses_as_other() {
        let mut buf = Vec::new();
        write_header(&mut buf);
        let mut payload = Vec::new();
        let mut flags = [0u8; 8];
        flags[..4].copy_from_slice(&2u32.to_le_bytes()); // struct class
        write_element(&mut payload, MI_UINT32, &flags);
        let mut dims = Vec::new();
        dims.extend_from_slice(&1i32.to_le_bytes());
        dims.extend_from_slice(&1i32.to_le_bytes());
        write_element(&mut payload, MI_INT32, &dims);
        write_element(&mut payload, MI_INT8, b"st");
        write_element(&mut buf, MI_MATRIX, &payload);

        let parsed = MatContainer::from_bytes(&buf).expect("parse struct entry");
        assert!(matches!(
            &parsed.entries[0].array,
            RawArray::Other { class, .. } if class == "struct"
        ));
    }

    #[test]
    fn big_endian_container_is_rejected() {
        let mut container = MatContainer::new();
        container.add_entry("m", RawArray::Matrix(NumericArray::scalar(1.0)));
        let mut bytes = container.to_bytes().expect("serialize");
        bytes[126..128].copy_from_slice(b"MI");
        let err = MatContainer::from_bytes(&bytes).expect_err("reject big-endian");
        assert!(err.to_string().contains("big-endian"));
    }

    #[test]
    fn truncated_container_is_rejected() {
        let mut container = MatContainer::new();
        container.add_entry(
            "m",
            RawArray::Matrix(NumericArray::from_rows(vec![vec![1.0, 2.0, 3.0]])),
        );
        let bytes = container.to_bytes().expect("serialize");
        let err = MatContainer::from_bytes(&bytes[..bytes.len() - 4]).expect_err("reject");
        assert!(matches!(err, ConvertError::Format { .. }));
    }

    #[test]
    fn surrogate_pairs_span_two_cells() {
        let chars = CharArray::from_str("a\u{1F600}");
        assert_eq!(chars.dims, vec![1, 3]);
        assert_eq!(chars.text(), "a\u{1F600}");
    }
}
