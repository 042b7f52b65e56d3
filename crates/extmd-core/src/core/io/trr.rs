//! GROMACS TRR (`GMX_trn_file`) frame store.
//!
//! A TRR file is a plain concatenation of frames, each an XDR header followed
//! by the box, virial, pressure, position, velocity and force blocks. There
//! is no index, so locating frame `k` means walking the headers of frames
//! `0..k`. [`TrrReader`] remembers the offsets of frames it has already proven
//! complete; in an append-only file those never move.

use super::error::{CorruptionKind, FrameStoreError};
use super::traits::{FrameReader, TrajectoryFormat};
use super::xdr::{self, XdrSlice};
use crate::core::models::frame::Frame;
use nalgebra::{Matrix3, Point3, Vector3};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const TRR_MAGIC: i32 = 1993;
pub const TRR_VERSION: &str = "GMX_trn_file";

/// Header bytes preceding the two trailing reals (`t`, `lambda`).
const FIXED_HEADER_LEN: usize = 4 + 4 + 4 + 12 + 13 * 4;
/// Upper bound of a header, reached with double precision reals.
const MAX_HEADER_LEN: usize = FIXED_HEADER_LEN + 2 * 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrrHeader {
    pub box_size: usize,
    pub vir_size: usize,
    pub pres_size: usize,
    pub x_size: usize,
    pub v_size: usize,
    pub f_size: usize,
    pub natoms: usize,
    pub step: i32,
    /// Width in bytes of every real in this frame (4 or 8).
    pub real_width: usize,
}

impl TrrHeader {
    #[inline]
    pub fn header_len(&self) -> usize {
        FIXED_HEADER_LEN + 2 * self.real_width
    }

    #[inline]
    pub fn body_len(&self) -> usize {
        self.box_size + self.vir_size + self.pres_size + self.x_size + self.v_size + self.f_size
    }

    #[inline]
    pub fn frame_len(&self) -> usize {
        self.header_len() + self.body_len()
    }

    fn parse(bytes: &[u8]) -> Result<Self, CorruptionKind> {
        let truncated = || CorruptionKind::TruncatedHeader {
            available: bytes.len() as u64,
            required: FIXED_HEADER_LEN as u64,
        };
        let mut r = XdrSlice::new(bytes);

        let magic = r.read_i32().ok_or_else(truncated)?;
        if magic != TRR_MAGIC {
            return Err(CorruptionKind::BadMagic(magic));
        }
        let slen = r.read_i32().ok_or_else(truncated)?;
        if slen != TRR_VERSION.len() as i32 + 1 {
            return Err(CorruptionKind::BadVersion);
        }
        let version_len = r.read_i32().ok_or_else(truncated)?;
        if version_len != TRR_VERSION.len() as i32 {
            return Err(CorruptionKind::BadVersion);
        }
        let version = r.read_opaque(TRR_VERSION.len()).ok_or_else(truncated)?;
        if version != TRR_VERSION.as_bytes() {
            return Err(CorruptionKind::BadVersion);
        }

        let mut ints = [0i32; 13];
        for slot in ints.iter_mut() {
            *slot = r.read_i32().ok_or_else(truncated)?;
        }
        let [
            ir_size,
            e_size,
            box_size,
            vir_size,
            pres_size,
            top_size,
            sym_size,
            x_size,
            v_size,
            f_size,
            natoms,
            step,
            _nre,
        ] = ints;

        if ints[..11].iter().any(|&v| v < 0) {
            return Err(CorruptionKind::InvalidBlockSizes(
                "negative size field".to_string(),
            ));
        }
        if ir_size != 0 || e_size != 0 || top_size != 0 || sym_size != 0 {
            return Err(CorruptionKind::InvalidBlockSizes(
                "unsupported ir/e/top/sym blocks".to_string(),
            ));
        }

        let natoms = natoms as usize;
        let real_width = infer_real_width(
            box_size as usize,
            x_size as usize,
            v_size as usize,
            f_size as usize,
            natoms,
        )?;

        let header = Self {
            box_size: box_size as usize,
            vir_size: vir_size as usize,
            pres_size: pres_size as usize,
            x_size: x_size as usize,
            v_size: v_size as usize,
            f_size: f_size as usize,
            natoms,
            step,
            real_width,
        };
        header.check_block_sizes()?;

        if r.remaining() < 2 * real_width {
            return Err(CorruptionKind::TruncatedHeader {
                available: bytes.len() as u64,
                required: header.header_len() as u64,
            });
        }
        Ok(header)
    }

    fn check_block_sizes(&self) -> Result<(), CorruptionKind> {
        let matrix = 9 * self.real_width;
        let per_atom = 3 * self.natoms * self.real_width;
        let checks = [
            ("box", self.box_size, matrix),
            ("virial", self.vir_size, matrix),
            ("pressure", self.pres_size, matrix),
            ("x", self.x_size, per_atom),
            ("v", self.v_size, per_atom),
            ("f", self.f_size, per_atom),
        ];
        for (name, size, expected) in checks {
            if size != 0 && size != expected {
                return Err(CorruptionKind::InvalidBlockSizes(format!(
                    "{name} block is {size} bytes, expected {expected}"
                )));
            }
        }
        Ok(())
    }
}

fn infer_real_width(
    box_size: usize,
    x_size: usize,
    v_size: usize,
    f_size: usize,
    natoms: usize,
) -> Result<usize, CorruptionKind> {
    let width = if box_size != 0 {
        box_size / 9
    } else if natoms != 0 {
        [x_size, v_size, f_size]
            .into_iter()
            .find(|&s| s != 0)
            .map_or(4, |s| s / (3 * natoms))
    } else {
        4
    };
    match width {
        4 | 8 => Ok(width),
        other => Err(CorruptionKind::InvalidBlockSizes(format!(
            "cannot infer precision (real width {other})"
        ))),
    }
}

fn decode_frame(header: &TrrHeader, bytes: &[u8]) -> Option<Frame> {
    let w = header.real_width;
    let mut r = XdrSlice::new(bytes);
    r.skip(header.header_len())?;

    let box_vectors = if header.box_size != 0 {
        let mut m = [0f32; 9];
        for v in m.iter_mut() {
            *v = r.read_real(w)?;
        }
        Matrix3::from_row_slice(&m)
    } else {
        Matrix3::zeros()
    };
    r.skip(header.vir_size + header.pres_size)?;

    let mut coordinates = Vec::new();
    if header.x_size != 0 {
        coordinates.reserve_exact(header.natoms);
        for _ in 0..header.natoms {
            coordinates.push(Point3::new(r.read_real(w)?, r.read_real(w)?, r.read_real(w)?));
        }
    }
    let mut velocities = Vec::new();
    if header.v_size != 0 {
        velocities.reserve_exact(header.natoms);
        for _ in 0..header.natoms {
            velocities.push(Vector3::new(r.read_real(w)?, r.read_real(w)?, r.read_real(w)?));
        }
    }

    Some(Frame::new(coordinates, velocities, box_vectors))
}

fn encode_frame(frame: &Frame, writer: &mut impl Write) -> io::Result<()> {
    let natoms = frame.n_atoms();
    let real = std::mem::size_of::<f32>() as i32;
    let per_atom = 3 * natoms as i32 * real;
    let v_size = if frame.has_velocities() { per_atom } else { 0 };

    xdr::write_i32(writer, TRR_MAGIC)?;
    xdr::write_i32(writer, TRR_VERSION.len() as i32 + 1)?;
    xdr::write_string(writer, TRR_VERSION)?;
    // ir, e, box, vir, pres, top, sym, x, v, f, natoms, step, nre
    let ints = [0, 0, 9 * real, 0, 0, 0, 0, per_atom, v_size, 0, natoms as i32, 0, 0];
    for v in ints {
        xdr::write_i32(writer, v)?;
    }
    // t, lambda
    xdr::write_f32(writer, 0.0)?;
    xdr::write_f32(writer, 0.0)?;

    for row in 0..3 {
        for col in 0..3 {
            xdr::write_f32(writer, frame.box_vectors[(row, col)])?;
        }
    }
    for p in &frame.coordinates {
        xdr::write_f32(writer, p.x)?;
        xdr::write_f32(writer, p.y)?;
        xdr::write_f32(writer, p.z)?;
    }
    for v in &frame.velocities {
        xdr::write_f32(writer, v.x)?;
        xdr::write_f32(writer, v.y)?;
        xdr::write_f32(writer, v.z)?;
    }
    Ok(())
}

/// The TRR trajectory format.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrrFormat;

impl TrajectoryFormat for TrrFormat {
    type Reader = TrrReader;

    fn extension(&self) -> &'static str {
        "trr"
    }

    fn open(&self, path: &Path) -> Result<TrrReader, FrameStoreError> {
        TrrReader::open(path)
    }

    fn write_frame(&self, path: &Path, frame: &Frame) -> Result<(), FrameStoreError> {
        // Existence is checked before contents: an existing file always wins.
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(|e| match e.kind() {
                io::ErrorKind::AlreadyExists => FrameStoreError::FileExists(path.to_path_buf()),
                _ => FrameStoreError::io(path, e),
            })?;

        if let Err(source) = frame.validate() {
            drop(file);
            if let Err(e) = fs::remove_file(path) {
                warn!(path = %path.display(), error = %e, "Could not remove rejected frame file.");
            }
            return Err(FrameStoreError::InvalidFrame {
                path: path.to_path_buf(),
                source,
            });
        }

        let mut writer = BufWriter::new(file);
        encode_frame(frame, &mut writer)
            .and_then(|()| writer.flush())
            .map_err(|e| FrameStoreError::io(path, e))?;
        debug!(path = %path.display(), n_atoms = frame.n_atoms(), "Wrote single-frame TRR file.");
        Ok(())
    }
}

/// Outcome of probing the frame starting at a known offset.
enum Probe {
    Complete(TrrHeader),
    Absent,
    Broken(CorruptionKind),
}

/// An open TRR file.
#[derive(Debug)]
pub struct TrrReader {
    path: PathBuf,
    file: File,
    /// `offsets[k]` is the byte offset of frame `k`. Every frame before the
    /// last entry has been seen complete.
    offsets: Vec<u64>,
}

impl TrrReader {
    pub fn open(path: &Path) -> Result<Self, FrameStoreError> {
        let file = File::open(path).map_err(|e| FrameStoreError::io(path, e))?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
            offsets: vec![0],
        })
    }

    /// Number of frames proven complete so far.
    fn known_frames(&self) -> usize {
        self.offsets.len() - 1
    }

    fn file_len(&self) -> Result<u64, FrameStoreError> {
        self.file
            .metadata()
            .map(|m| m.len())
            .map_err(|e| FrameStoreError::io(&self.path, e))
    }

    fn read_at(&mut self, offset: u64, len: usize) -> Result<Vec<u8>, FrameStoreError> {
        let mut buf = Vec::with_capacity(len);
        self.file
            .seek(SeekFrom::Start(offset))
            .and_then(|_| (&mut self.file).take(len as u64).read_to_end(&mut buf))
            .map_err(|e| FrameStoreError::io(&self.path, e))?;
        Ok(buf)
    }

    fn probe(&mut self, offset: u64, file_len: u64) -> Result<Probe, FrameStoreError> {
        if offset >= file_len {
            return Ok(Probe::Absent);
        }
        let available = file_len - offset;
        let bytes = self.read_at(offset, MAX_HEADER_LEN.min(available as usize))?;
        let header = match TrrHeader::parse(&bytes) {
            Ok(h) => h,
            Err(kind) => return Ok(Probe::Broken(kind)),
        };
        let required = header.frame_len() as u64;
        if available < required {
            return Ok(Probe::Broken(CorruptionKind::TruncatedBody {
                available,
                required,
            }));
        }
        Ok(Probe::Complete(header))
    }

    /// Walks forward from the last known frame until `index` is proven
    /// complete, returning its header.
    fn locate(&mut self, index: usize) -> Result<TrrHeader, FrameStoreError> {
        let file_len = self.file_len()?;
        loop {
            let k = self.known_frames();
            let offset = self.offsets[k.min(index)];
            match self.probe(offset, file_len)? {
                Probe::Complete(header) if k > index => return Ok(header),
                Probe::Complete(header) => {
                    let end = offset + header.frame_len() as u64;
                    self.offsets.push(end);
                    if k == index {
                        return Ok(header);
                    }
                }
                Probe::Absent => {
                    return Err(FrameStoreError::FrameNotFound {
                        path: self.path.clone(),
                        index,
                        available: k,
                    });
                }
                Probe::Broken(kind) if k == index => {
                    return Err(FrameStoreError::FrameCorrupt {
                        path: self.path.clone(),
                        index,
                        kind,
                    });
                }
                // An earlier frame is still being written, so `index` cannot exist yet.
                Probe::Broken(kind) if kind.is_truncation() => {
                    return Err(FrameStoreError::FrameNotFound {
                        path: self.path.clone(),
                        index,
                        available: k,
                    });
                }
                Probe::Broken(_) => {
                    return Err(FrameStoreError::FrameCorrupt {
                        path: self.path.clone(),
                        index,
                        kind: CorruptionKind::MalformedPredecessor(k),
                    });
                }
            }
        }
    }

    /// Counts the frames currently complete on disk.
    ///
    /// A trailing partial frame is not counted.
    pub fn count_complete_frames(&mut self) -> Result<usize, FrameStoreError> {
        let mut n = self.known_frames();
        loop {
            match self.locate(n) {
                Ok(_) => n += 1,
                Err(e) if e.is_transient() => return Ok(n),
                Err(e) => return Err(e),
            }
        }
    }
}

impl FrameReader for TrrReader {
    fn path(&self) -> &Path {
        &self.path
    }

    fn read_frame(&mut self, index: usize) -> Result<Frame, FrameStoreError> {
        let header = self.locate(index)?;
        let offset = self.offsets[index];
        let bytes = self.read_at(offset, header.frame_len())?;
        decode_frame(&header, &bytes).ok_or_else(|| FrameStoreError::FrameCorrupt {
            path: self.path.clone(),
            index,
            kind: CorruptionKind::TruncatedBody {
                available: bytes.len() as u64,
                required: header.frame_len() as u64,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn sample_frame(n_atoms: usize, seed: f32) -> Frame {
        let coordinates = (0..n_atoms)
            .map(|i| Point3::new(seed + i as f32, seed * 0.5, -(i as f32)))
            .collect();
        let velocities = (0..n_atoms)
            .map(|i| Vector3::new(0.25 * i as f32, seed, 1.5))
            .collect();
        let box_vectors = Matrix3::new(3.0, 0.0, 0.0, 0.0, 3.5, 0.0, 0.0, 0.0, 4.0);
        Frame::new(coordinates, velocities, box_vectors)
    }

    fn encoded(frame: &Frame) -> Vec<u8> {
        let mut buf = Vec::new();
        encode_frame(frame, &mut buf).unwrap();
        buf
    }

    fn write_frames(path: &Path, frames: &[Frame]) {
        let mut bytes = Vec::new();
        for f in frames {
            bytes.extend(encoded(f));
        }
        fs::write(path, bytes).unwrap();
    }

    #[test]
    fn encoded_frame_has_expected_length() {
        let frame = sample_frame(5, 1.0);
        let bytes = encoded(&frame);
        assert_eq!(bytes.len(), 84 + 36 + 2 * 5 * 12);
    }

    #[test]
    fn write_then_read_returns_identical_frame() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("initial_frame.trr");
        let frame = sample_frame(7, 2.0);

        TrrFormat.write_frame(&path, &frame).unwrap();
        let read = TrrFormat.read(&path, 0).unwrap();
        assert_eq!(read, frame);
    }

    #[test]
    fn write_refuses_to_overwrite_existing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("exists.trr");
        fs::write(&path, b"precious").unwrap();

        let result = TrrFormat.write_frame(&path, &sample_frame(2, 0.0));
        assert!(matches!(result, Err(FrameStoreError::FileExists(p)) if p == path));
        assert_eq!(fs::read(&path).unwrap(), b"precious");
    }

    #[test]
    fn existing_file_wins_over_invalid_frame() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("0000001.trr");
        fs::write(&path, b"precious").unwrap();
        let mut frame = sample_frame(3, 0.0);
        frame.velocities.pop();

        let result = TrrFormat.write_frame(&path, &frame);
        assert!(matches!(result, Err(FrameStoreError::FileExists(p)) if p == path));
        assert_eq!(fs::read(&path).unwrap(), b"precious");
    }

    #[test]
    fn write_rejects_mismatched_velocities() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.trr");
        let mut frame = sample_frame(3, 0.0);
        frame.velocities.pop();

        let result = TrrFormat.write_frame(&path, &frame);
        assert!(matches!(result, Err(FrameStoreError::InvalidFrame { .. })));
        assert!(!path.exists());
    }

    #[test]
    fn frames_without_velocities_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("novel.trr");
        let mut frame = sample_frame(3, 1.0);
        frame.velocities.clear();

        TrrFormat.write_frame(&path, &frame).unwrap();
        assert_eq!(TrrFormat.read(&path, 0).unwrap(), frame);
    }

    #[test]
    fn frames_are_addressable_by_index() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("multi.trr");
        let frames: Vec<_> = (0..4).map(|i| sample_frame(3, i as f32)).collect();
        write_frames(&path, &frames);

        let mut reader = TrrReader::open(&path).unwrap();
        assert_eq!(reader.read_frame(2).unwrap(), frames[2]);
        assert_eq!(reader.read_frame(0).unwrap(), frames[0]);
        assert_eq!(reader.read_frame(3).unwrap(), frames[3]);
        assert_eq!(reader.count_complete_frames().unwrap(), 4);
    }

    #[test]
    fn reading_past_the_end_is_not_found() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("short.trr");
        write_frames(&path, &[sample_frame(2, 0.0), sample_frame(2, 1.0)]);

        let mut reader = TrrReader::open(&path).unwrap();
        match reader.read_frame(2) {
            Err(FrameStoreError::FrameNotFound {
                index, available, ..
            }) => {
                assert_eq!(index, 2);
                assert_eq!(available, 2);
            }
            other => panic!("expected FrameNotFound, got {other:?}"),
        }
        assert!(matches!(
            reader.read_frame(9),
            Err(FrameStoreError::FrameNotFound { .. })
        ));
    }

    #[test]
    fn truncated_header_is_corrupt() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("partial.trr");
        let mut bytes = encoded(&sample_frame(2, 0.0));
        bytes.extend(&encoded(&sample_frame(2, 1.0))[..10]);
        fs::write(&path, bytes).unwrap();

        let mut reader = TrrReader::open(&path).unwrap();
        assert!(reader.read_frame(0).is_ok());
        assert!(matches!(
            reader.read_frame(1),
            Err(FrameStoreError::FrameCorrupt {
                kind: CorruptionKind::TruncatedHeader { .. },
                ..
            })
        ));
        assert!(matches!(
            reader.read_frame(2),
            Err(FrameStoreError::FrameNotFound { available: 1, .. })
        ));
        assert_eq!(reader.count_complete_frames().unwrap(), 1);
    }

    #[test]
    fn truncated_body_is_corrupt() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("body.trr");
        let bytes = encoded(&sample_frame(4, 0.0));
        fs::write(&path, &bytes[..bytes.len() - 5]).unwrap();

        let mut reader = TrrReader::open(&path).unwrap();
        assert!(matches!(
            reader.read_frame(0),
            Err(FrameStoreError::FrameCorrupt {
                kind: CorruptionKind::TruncatedBody { .. },
                ..
            })
        ));
    }

    #[test]
    fn open_reader_sees_frames_appended_later() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("growing.trr");
        let first = encoded(&sample_frame(2, 0.0));
        let second = encoded(&sample_frame(2, 1.0));
        fs::write(&path, &first).unwrap();

        let mut reader = TrrReader::open(&path).unwrap();
        assert!(matches!(
            reader.read_frame(1),
            Err(FrameStoreError::FrameNotFound { .. })
        ));

        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(&second[..20]).unwrap();
        file.flush().unwrap();
        assert!(matches!(
            reader.read_frame(1),
            Err(FrameStoreError::FrameCorrupt { .. })
        ));

        file.write_all(&second[20..]).unwrap();
        file.flush().unwrap();
        assert_eq!(reader.read_frame(1).unwrap(), sample_frame(2, 1.0));
    }

    #[test]
    fn bad_magic_is_corrupt() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("magic.trr");
        let mut bytes = encoded(&sample_frame(1, 0.0));
        bytes[3] = 0;
        fs::write(&path, bytes).unwrap();

        assert!(matches!(
            TrrFormat.read(&path, 0),
            Err(FrameStoreError::FrameCorrupt {
                kind: CorruptionKind::BadMagic(_),
                ..
            })
        ));
    }

    #[test]
    fn malformed_predecessor_is_reported_as_corrupt() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("middle.trr");
        let mut bytes = encoded(&sample_frame(1, 0.0));
        bytes[0] = 0xFF;
        bytes.extend(encoded(&sample_frame(1, 1.0)));
        fs::write(&path, bytes).unwrap();

        assert!(matches!(
            TrrFormat.read(&path, 1),
            Err(FrameStoreError::FrameCorrupt {
                kind: CorruptionKind::MalformedPredecessor(0),
                ..
            })
        ));
    }

    #[test]
    fn garbage_version_length_is_malformed_not_truncated() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("0000001.trr");
        let mut bytes = encoded(&sample_frame(1, 0.0));
        bytes[8..12].copy_from_slice(&999i32.to_be_bytes());
        bytes.extend(encoded(&sample_frame(1, 1.0)));
        fs::write(&path, bytes).unwrap();

        let mut reader = TrrReader::open(&path).unwrap();
        assert!(matches!(
            reader.read_frame(0),
            Err(FrameStoreError::FrameCorrupt {
                kind: CorruptionKind::BadVersion,
                ..
            })
        ));
        assert!(matches!(
            reader.read_frame(1),
            Err(FrameStoreError::FrameCorrupt {
                kind: CorruptionKind::MalformedPredecessor(0),
                ..
            })
        ));
    }

    #[test]
    fn double_precision_frames_are_narrowed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("double.trr");
        let mut bytes = Vec::new();
        xdr::write_i32(&mut bytes, TRR_MAGIC).unwrap();
        xdr::write_i32(&mut bytes, 13).unwrap();
        xdr::write_string(&mut bytes, TRR_VERSION).unwrap();
        for v in [0, 0, 72, 0, 0, 0, 0, 24, 0, 0, 1, 10, 0] {
            xdr::write_i32(&mut bytes, v).unwrap();
        }
        let mut push_f64 = |v: f64| bytes.extend(v.to_be_bytes());
        push_f64(0.0);
        push_f64(0.0);
        for v in [2.0, 0.0, 0.0, 0.0, 2.0, 0.0, 0.0, 0.0, 2.0] {
            push_f64(v);
        }
        for v in [0.5, 1.0, 1.5] {
            push_f64(v);
        }
        fs::write(&path, bytes).unwrap();

        let frame = TrrFormat.read(&path, 0).unwrap();
        assert_eq!(frame.coordinates, vec![Point3::new(0.5, 1.0, 1.5)]);
        assert!(frame.velocities.is_empty());
        assert_eq!(frame.box_vectors, Matrix3::identity() * 2.0);
    }

    #[test]
    fn opening_missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let result = TrrReader::open(&dir.path().join("nope.trr"));
        assert!(matches!(result, Err(FrameStoreError::Io { .. })));
    }
}
