//! Binary geometric payload.
//!
//! The payload carries the exact representation of every persistent item,
//! keyed by logical identity. Layout: an uncompressed header (magic +
//! format version) followed by a gzip stream of little-endian records.
//! Temporary objects are never written.

use crate::error::{GeomError, Result};
use crate::geometry::{CurveRep, RegionRep, Representation, SolidRep};
use crate::types::{ItemId, Vector3};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::{self, Read, Write};

use super::FORMAT_VERSION;

const MAGIC: &[u8; 4] = b"GDBP";

const TAG_SOLID: u8 = 1;
const TAG_CURVE: u8 = 2;
const TAG_REGION: u8 = 3;

fn read_err(e: io::Error) -> GeomError {
    match e.kind() {
        io::ErrorKind::UnexpectedEof => GeomError::corrupt("geometric payload is truncated"),
        io::ErrorKind::InvalidData | io::ErrorKind::InvalidInput => {
            GeomError::corrupt(format!("geometric payload is malformed: {e}"))
        }
        _ => GeomError::Io(e),
    }
}

fn write_point(w: &mut impl Write, p: &Vector3) -> io::Result<()> {
    w.write_f64::<LittleEndian>(p.x)?;
    w.write_f64::<LittleEndian>(p.y)?;
    w.write_f64::<LittleEndian>(p.z)
}

fn read_point(r: &mut impl Read) -> io::Result<Vector3> {
    let x = r.read_f64::<LittleEndian>()?;
    let y = r.read_f64::<LittleEndian>()?;
    let z = r.read_f64::<LittleEndian>()?;
    Ok(Vector3::new(x, y, z))
}

fn write_rep(w: &mut impl Write, rep: &Representation) -> io::Result<()> {
    match rep {
        Representation::Solid(solid) => {
            w.write_u8(TAG_SOLID)?;
            w.write_u32::<LittleEndian>(solid.vertices.len() as u32)?;
            w.write_u32::<LittleEndian>(solid.triangles.len() as u32)?;
            for v in &solid.vertices {
                write_point(w, v)?;
            }
            for t in &solid.triangles {
                for i in t {
                    w.write_u32::<LittleEndian>(*i)?;
                }
            }
        }
        Representation::Curve(curve) => {
            w.write_u8(TAG_CURVE)?;
            w.write_u32::<LittleEndian>(curve.points.len() as u32)?;
            w.write_u8(u8::from(curve.closed))?;
            for p in &curve.points {
                write_point(w, p)?;
            }
        }
        Representation::Region(region) => {
            w.write_u8(TAG_REGION)?;
            w.write_u32::<LittleEndian>(region.boundary.len() as u32)?;
            for p in &region.boundary {
                write_point(w, p)?;
            }
        }
    }
    Ok(())
}

fn read_rep(r: &mut impl Read) -> Result<Representation> {
    let tag = r.read_u8().map_err(read_err)?;
    let rep = match tag {
        TAG_SOLID => {
            let vertex_count = r.read_u32::<LittleEndian>().map_err(read_err)? as usize;
            let triangle_count = r.read_u32::<LittleEndian>().map_err(read_err)? as usize;
            let mut vertices = Vec::with_capacity(vertex_count.min(1 << 20));
            for _ in 0..vertex_count {
                vertices.push(read_point(r).map_err(read_err)?);
            }
            let mut triangles = Vec::with_capacity(triangle_count.min(1 << 20));
            for _ in 0..triangle_count {
                let a = r.read_u32::<LittleEndian>().map_err(read_err)?;
                let b = r.read_u32::<LittleEndian>().map_err(read_err)?;
                let c = r.read_u32::<LittleEndian>().map_err(read_err)?;
                triangles.push([a, b, c]);
            }
            Representation::Solid(SolidRep {
                vertices,
                triangles,
            })
        }
        TAG_CURVE => {
            let point_count = r.read_u32::<LittleEndian>().map_err(read_err)? as usize;
            let closed = match r.read_u8().map_err(read_err)? {
                0 => false,
                1 => true,
                other => {
                    return Err(GeomError::corrupt(format!(
                        "invalid closed flag {other}"
                    )))
                }
            };
            let mut points = Vec::with_capacity(point_count.min(1 << 20));
            for _ in 0..point_count {
                points.push(read_point(r).map_err(read_err)?);
            }
            Representation::Curve(CurveRep { points, closed })
        }
        TAG_REGION => {
            let point_count = r.read_u32::<LittleEndian>().map_err(read_err)? as usize;
            let mut boundary = Vec::with_capacity(point_count.min(1 << 20));
            for _ in 0..point_count {
                boundary.push(read_point(r).map_err(read_err)?);
            }
            Representation::Region(RegionRep { boundary })
        }
        other => {
            return Err(GeomError::corrupt(format!(
                "unknown representation tag {other}"
            )))
        }
    };
    rep.validate()
        .map_err(|e| GeomError::corrupt(format!("invalid stored representation: {e}")))?;
    Ok(rep)
}

/// Encode representations into the payload byte stream
pub fn encode<'a>(
    entries: impl ExactSizeIterator<Item = (ItemId, &'a Representation)>,
) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    out.extend_from_slice(MAGIC);
    out.write_u32::<LittleEndian>(FORMAT_VERSION)?;

    let mut body = GzEncoder::new(out, Compression::default());
    body.write_u32::<LittleEndian>(entries.len() as u32)?;
    for (id, rep) in entries {
        body.write_u64::<LittleEndian>(id.value())?;
        write_rep(&mut body, rep)?;
    }
    Ok(body.finish()?)
}

/// Decode a payload byte stream.
///
/// Any structural defect, truncation, an unknown tag, a representation
/// that fails validation, or a duplicated item id, reports
/// [`GeomError::CorruptDocument`].
pub fn decode(bytes: &[u8]) -> Result<Vec<(ItemId, Representation)>> {
    let mut cursor = io::Cursor::new(bytes);

    let mut magic = [0u8; 4];
    cursor.read_exact(&mut magic).map_err(read_err)?;
    if &magic != MAGIC {
        return Err(GeomError::corrupt("bad payload magic"));
    }
    let format = cursor.read_u32::<LittleEndian>().map_err(read_err)?;
    if format != FORMAT_VERSION {
        return Err(GeomError::corrupt(format!(
            "unsupported payload format {format}"
        )));
    }

    let mut body = GzDecoder::new(cursor);
    let count = body.read_u32::<LittleEndian>().map_err(read_err)? as usize;
    let mut entries = Vec::with_capacity(count.min(1 << 20));
    for _ in 0..count {
        let id = ItemId::new(body.read_u64::<LittleEndian>().map_err(read_err)?);
        if entries.iter().any(|(seen, _)| *seen == id) {
            return Err(GeomError::corrupt(format!("{id} stored twice in payload")));
        }
        let rep = read_rep(&mut body)?;
        entries.push((id, rep));
    }
    Ok(entries)
}
