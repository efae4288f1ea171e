//! The `.ams` mesh format
//!
//! A text header followed by one labelled block per non-empty buffer:
//!
//! ```text
//! ams_mesh
//! version 1
//! binary | ascii
//! vertex_count N
//! normal_count N
//! tangent_count N
//! uv_count N
//! uv2_count N
//! uv3_count N
//! uv4_count N
//! color_count N
//! face_count N
//! submesh_count N
//!
//! vertices
//! <data>
//! normals
//! <data>
//! ...
//! ```
//!
//! Blocks appear in the order of the count lines and only when their count is
//! non-zero. Binary blocks are native-endian `f32` dumps followed by a newline;
//! index lists are a `u32` length, the `u32` indices and a newline. ASCII
//! blocks hold one space-separated element per line; index lists are written as
//! `len  i0 i1 ... \n`.
//!
//! The reader finds each block by scanning forward for its label line rather
//! than by offset.

use super::{IndexList, Mesh, MeshError, MeshLoader};
use bytemuck::Pod;
use std::fmt::Display;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

const HEADER: &str = "ams_mesh";
const VERSION: &str = "1";

#[derive(Clone, Copy)]
struct Block {
    count: &'static str,
    label: &'static str,
}

const fn block(count: &'static str, label: &'static str) -> Block {
    Block { count, label }
}

const VERTICES: Block = block("vertex_count", "vertices");
const NORMALS: Block = block("normal_count", "normals");
const TANGENTS: Block = block("tangent_count", "tangents");
const UV: Block = block("uv_count", "uv");
const UV2: Block = block("uv2_count", "uv2");
const UV3: Block = block("uv3_count", "uv3");
const UV4: Block = block("uv4_count", "uv4");
const COLORS: Block = block("color_count", "colors");
const FACES: Block = block("face_count", "faces");
const SUBMESHES: Block = block("submesh_count", "submeshes");

const BLOCKS: [Block; 10] = [
    VERTICES, NORMALS, TANGENTS, UV, UV2, UV3, UV4, COLORS, FACES, SUBMESHES,
];

/// Loader for `.ams` files
#[derive(Debug, Default, Clone, Copy)]
pub struct AmsMeshLoader;

impl AmsMeshLoader {
    /// Extension of the format
    pub const FILETYPE: &'static str = "ams";
}

impl MeshLoader for AmsMeshLoader {
    fn filetype(&self) -> &str {
        Self::FILETYPE
    }

    fn load(&self, path: &Path) -> Result<Mesh, MeshError> {
        let bytes = std::fs::read(path).map_err(|source| MeshError::Io {
            path: path.to_owned(),
            source,
        });
        bytes
            .and_then(|bytes| parse(path, &bytes))
            .map_err(|err| {
                log::error!("Failed to load mesh: {err}");
                err
            })
    }
}

impl Mesh {
    /// Serialize the mesh as `.ams` into any writer
    pub fn write_ams<W: Write>(&self, writer: &mut W, binary: bool) -> io::Result<()> {
        writeln!(writer, "{HEADER}")?;
        writeln!(writer, "version {VERSION}")?;
        writeln!(writer, "{}", if binary { "binary" } else { "ascii" })?;

        let counts = [
            self.vertex_count(),
            self.normal_count(),
            self.tangent_count(),
            self.uv_count(),
            self.uv2_count(),
            self.uv3_count(),
            self.uv4_count(),
            self.color_count(),
            self.face_count(),
            self.submesh_count(),
        ];
        for (block, count) in BLOCKS.iter().zip(counts) {
            writeln!(writer, "{} {count}", block.count)?;
        }
        writeln!(writer)?;

        let format = Format { binary };
        format.floats(writer, VERTICES, bytemuck::cast_slice(self.vertices()), 3)?;
        format.floats(writer, NORMALS, bytemuck::cast_slice(self.normals()), 3)?;
        format.floats(writer, TANGENTS, bytemuck::cast_slice(self.tangents()), 3)?;
        format.floats(writer, UV, bytemuck::cast_slice(self.uv()), 2)?;
        format.floats(writer, UV2, bytemuck::cast_slice(self.uv2()), 2)?;
        format.floats(writer, UV3, bytemuck::cast_slice(self.uv3()), 2)?;
        format.floats(writer, UV4, bytemuck::cast_slice(self.uv4()), 2)?;
        format.floats(writer, COLORS, bytemuck::cast_slice(self.colors()), 4)?;
        format.index_lists(writer, FACES, self.faces())?;
        format.index_lists(writer, SUBMESHES, self.submeshes())?;
        Ok(())
    }
}

/// Write `mesh` to `path`, replacing any existing file
pub(super) fn save(mesh: &Mesh, path: &Path, binary: bool) -> Result<(), MeshError> {
    let io_error = |source| {
        log::error!("Could not write mesh {}: {source}", path.display());
        MeshError::Io {
            path: path.to_owned(),
            source,
        }
    };

    let file = File::create(path)
        .or_else(|err| {
            log::warn!("Could not create {}: {err}, retrying", path.display());
            OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(path)
        })
        .map_err(io_error)?;

    let mut writer = BufWriter::new(file);
    mesh.write_ams(&mut writer, binary)
        .and_then(|()| writer.flush())
        .map_err(io_error)?;

    log::debug!("Saved mesh to {}", path.display());
    Ok(())
}

struct Format {
    binary: bool,
}

impl Format {
    fn floats<W: Write>(&self, writer: &mut W, block: Block, data: &[f32], arity: usize) -> io::Result<()> {
        if data.is_empty() {
            return Ok(());
        }
        writeln!(writer, "{}", block.label)?;
        if self.binary {
            writer.write_all(bytemuck::cast_slice(data))?;
            return writeln!(writer);
        }
        for element in data.chunks(arity) {
            for (i, value) in element.iter().enumerate() {
                if i > 0 {
                    write!(writer, " ")?;
                }
                write!(writer, "{value}")?;
            }
            writeln!(writer)?;
        }
        Ok(())
    }

    fn index_lists<W: Write>(&self, writer: &mut W, block: Block, lists: &[IndexList]) -> io::Result<()> {
        if lists.is_empty() {
            return Ok(());
        }
        writeln!(writer, "{}", block.label)?;
        for list in lists {
            if self.binary {
                let len = list.len() as u32;
                writer.write_all(bytemuck::bytes_of(&len))?;
                writer.write_all(bytemuck::cast_slice(list.as_slice()))?;
            } else {
                write!(writer, "{}  ", list.len())?;
                for index in list {
                    write!(writer, "{index} ")?;
                }
            }
            writeln!(writer)?;
        }
        Ok(())
    }
}

/// Parse the contents of an `.ams` file read from `path`
pub(super) fn parse(path: &Path, bytes: &[u8]) -> Result<Mesh, MeshError> {
    let mut reader = Reader {
        path,
        bytes,
        pos: 0,
        binary: false,
    };

    let header = reader.line().unwrap_or_default();
    if header != HEADER.as_bytes() {
        return Err(MeshError::InvalidHeader {
            path: path.to_owned(),
        });
    }

    let version = reader.header_value("version")?;
    if version != VERSION {
        return Err(MeshError::UnsupportedVersion {
            path: path.to_owned(),
            version: version.to_owned(),
        });
    }

    reader.binary = reader.line() == Some(b"binary".as_slice());

    let mut counts = [0usize; BLOCKS.len()];
    for (count, block) in counts.iter_mut().zip(BLOCKS) {
        let value = reader.header_value(block.count)?;
        *count = value
            .parse()
            .map_err(|err| reader.error(format!("invalid {} '{value}': {err}", block.count)))?;
    }
    let [vertices, normals, tangents, uv, uv2, uv3, uv4, colors, faces, submeshes] = counts;

    let mut mesh = Mesh::default();
    mesh.set_vertices(reader.vectors(VERTICES, vertices)?);
    mesh.set_normals(reader.vectors(NORMALS, normals)?);
    mesh.set_tangents(reader.vectors(TANGENTS, tangents)?);
    mesh.set_uv(reader.vectors(UV, uv)?);
    mesh.set_uv2(reader.vectors(UV2, uv2)?);
    mesh.set_uv3(reader.vectors(UV3, uv3)?);
    mesh.set_uv4(reader.vectors(UV4, uv4)?);
    mesh.set_colors(reader.vectors(COLORS, colors)?);
    mesh.set_faces(reader.index_lists(FACES, faces, "face")?);
    mesh.set_submeshes(reader.index_lists(SUBMESHES, submeshes, "submesh")?);
    Ok(mesh)
}

struct Reader<'a> {
    path: &'a Path,
    bytes: &'a [u8],
    pos: usize,
    binary: bool,
}

impl<'a> Reader<'a> {
    fn error(&self, message: impl Into<String>) -> MeshError {
        MeshError::Parse {
            path: self.path_buf(),
            message: message.into(),
        }
    }

    fn path_buf(&self) -> PathBuf {
        self.path.to_owned()
    }

    fn eof(&self) -> MeshError {
        self.error("unexpected end of file")
    }

    /// Next line without its terminator
    fn line(&mut self) -> Option<&'a [u8]> {
        let rest = self.bytes.get(self.pos..).filter(|rest| !rest.is_empty())?;
        let (line, advance) = match rest.iter().position(|&b| b == b'\n') {
            Some(end) => (&rest[..end], end + 1),
            None => (rest, rest.len()),
        };
        self.pos += advance;
        Some(line.strip_suffix(b"\r").unwrap_or(line))
    }

    /// Value after the first space of the next header line
    fn header_value(&mut self, name: &str) -> Result<&'a str, MeshError> {
        let line = self.line().ok_or_else(|| self.eof())?;
        let text = std::str::from_utf8(line)
            .map_err(|_| self.error(format!("{name} line is not text")))?;
        Ok(text.split_once(' ').map_or("", |(_, value)| value.trim()))
    }

    fn seek(&mut self, block: Block) -> Result<(), MeshError> {
        while let Some(line) = self.line() {
            if line == block.label.as_bytes() {
                return Ok(());
            }
        }
        Err(MeshError::MissingBlock {
            path: self.path_buf(),
            count: block.count,
            label: block.label,
        })
    }

    fn pod<T: Pod>(&mut self, count: usize) -> Result<Vec<T>, MeshError> {
        let size = std::mem::size_of::<T>();
        let end = count
            .checked_mul(size)
            .and_then(|len| self.pos.checked_add(len))
            .filter(|&end| end <= self.bytes.len())
            .ok_or_else(|| self.eof())?;
        let values = self.bytes[self.pos..end]
            .chunks_exact(size)
            .map(bytemuck::pod_read_unaligned)
            .collect();
        self.pos = end;
        Ok(values)
    }

    fn token<T>(&mut self) -> Result<T, MeshError>
    where
        T: FromStr,
        T::Err: Display,
    {
        let is_space = |b: &u8| b.is_ascii_whitespace();
        while self.bytes.get(self.pos).is_some_and(is_space) {
            self.pos += 1;
        }
        let start = self.pos;
        while self.bytes.get(self.pos).is_some_and(|b| !is_space(b)) {
            self.pos += 1;
        }
        if start == self.pos {
            return Err(self.eof());
        }
        let text = std::str::from_utf8(&self.bytes[start..self.pos])
            .map_err(|_| self.error("value is not text"))?;
        text.parse()
            .map_err(|err| self.error(format!("invalid value '{text}': {err}")))
    }

    fn vectors<const N: usize>(&mut self, block: Block, count: usize) -> Result<Vec<[f32; N]>, MeshError> {
        if count == 0 {
            return Ok(Vec::new());
        }
        self.seek(block)?;

        let len = count.checked_mul(N).ok_or_else(|| self.eof())?;
        let flat: Vec<f32> = if self.binary {
            self.pod(len)?
        } else {
            (0..len).map(|_| self.token()).collect::<Result<_, _>>()?
        };
        Ok(flat
            .chunks_exact(N)
            .map(|chunk| std::array::from_fn(|i| chunk[i]))
            .collect())
    }

    fn index_lists(&mut self, block: Block, count: usize, kind: &'static str) -> Result<Vec<IndexList>, MeshError> {
        if count == 0 {
            return Ok(Vec::new());
        }
        self.seek(block)?;
        (0..count).map(|_| self.index_list(kind)).collect()
    }

    fn index_list(&mut self, kind: &'static str) -> Result<IndexList, MeshError> {
        if self.binary {
            let len: Vec<u32> = self.pod(1)?;
            let list = self.pod(len[0] as usize)?;
            // trailing newline
            if self.pos < self.bytes.len() {
                self.pos += 1;
            }
            return Ok(list);
        }

        let len: i64 = self.token()?;
        if len <= 0 {
            return Err(MeshError::InvalidIndexCount {
                path: self.path_buf(),
                kind,
            });
        }
        (0..len).map(|_| self.token()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Mesh {
        let mut mesh = Mesh::new(
            vec![
                [0.0, 0.0, 0.0],
                [1.0, 0.1, -2.5],
                [0.333_333_34, 1e-7, 12345.678],
                [-1.0, 1.0, 0.0],
            ],
            vec![vec![0, 1, 2], vec![0, 2, 3]],
        );
        mesh.set_normals(Mesh::generate_normals(mesh.vertices(), mesh.faces()));
        mesh.set_uv(vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]);
        mesh.set_colors(vec![[0.1, 0.2, 0.3, 1.0]; 4]);
        mesh.set_submeshes(vec![vec![0], vec![1]]);
        mesh
    }

    fn encode(mesh: &Mesh, binary: bool) -> Vec<u8> {
        let mut bytes = Vec::new();
        mesh.write_ams(&mut bytes, binary).unwrap();
        bytes
    }

    fn decode(bytes: &[u8]) -> Result<Mesh, MeshError> {
        parse(Path::new("test.ams"), bytes)
    }

    #[test]
    fn test_ascii_layout() {
        let mesh = Mesh::new(vec![[1.0, 2.5, -3.0]], vec![vec![0, 0, 0]]);
        let text = String::from_utf8(encode(&mesh, false)).unwrap();
        assert_eq!(
            text,
            "ams_mesh\nversion 1\nascii\n\
             vertex_count 1\nnormal_count 0\ntangent_count 0\nuv_count 0\n\
             uv2_count 0\nuv3_count 0\nuv4_count 0\ncolor_count 0\n\
             face_count 1\nsubmesh_count 0\n\n\
             vertices\n1 2.5 -3\n\
             faces\n3  0 0 0 \n"
        );
    }

    #[test]
    fn test_binary_layout() {
        let mesh = Mesh::new(vec![[1.0, 2.0, 3.0]], vec![vec![0, 0, 0]]);
        let bytes = encode(&mesh, true);
        let header_end = b"submesh_count 0\n\nvertices\n";
        let start = bytes
            .windows(header_end.len())
            .position(|w| w == header_end)
            .unwrap()
            + header_end.len();
        assert_eq!(&bytes[start..start + 4], &1.0f32.to_ne_bytes());
        assert_eq!(bytes[start + 12], b'\n');
        assert_eq!(&bytes[start + 13..start + 19], b"faces\n");
        assert_eq!(&bytes[start + 19..start + 23], &3u32.to_ne_bytes());
        assert_eq!(bytes.len(), start + 23 + 12 + 1);
    }

    #[test]
    fn test_round_trip_is_exact() {
        let mesh = sample();
        assert_eq!(decode(&encode(&mesh, true)).unwrap(), mesh);
        assert_eq!(decode(&encode(&mesh, false)).unwrap(), mesh);
    }

    #[test]
    fn test_empty_mesh_round_trip() {
        let mesh = Mesh::default();
        assert_eq!(decode(&encode(&mesh, false)).unwrap(), mesh);
        assert_eq!(decode(&encode(&mesh, true)).unwrap(), mesh);
    }

    #[test]
    fn test_blocks_found_by_label() {
        let text = "ams_mesh\nversion 1\nascii\nvertex_count 1\nnormal_count 0\n\
                    tangent_count 0\nuv_count 0\nuv2_count 0\nuv3_count 0\nuv4_count 0\n\
                    color_count 0\nface_count 0\nsubmesh_count 0\n\n\
                    some comment\n\nvertices\r\n4 5 6\n";
        let mesh = decode(text.as_bytes()).unwrap();
        assert_eq!(mesh.vertices(), [[4.0, 5.0, 6.0]]);
    }

    #[test]
    fn test_invalid_header() {
        let err = decode(b"obj_mesh\nversion 1\n").unwrap_err();
        assert!(matches!(err, MeshError::InvalidHeader { .. }));
        assert!(matches!(decode(b"").unwrap_err(), MeshError::InvalidHeader { .. }));
    }

    #[test]
    fn test_unsupported_version() {
        let err = decode(b"ams_mesh\nversion 2\nascii\n").unwrap_err();
        assert!(matches!(err, MeshError::UnsupportedVersion { version, .. } if version == "2"));
    }

    #[test]
    fn test_missing_block() {
        let mut bytes = encode(&sample(), false);
        let text = String::from_utf8(bytes.clone()).unwrap();
        bytes.truncate(text.find("colors").unwrap());

        let err = decode(&bytes).unwrap_err();
        assert!(matches!(err, MeshError::MissingBlock { label: "colors", .. }));
        assert_eq!(
            err.to_string(),
            "color_count > 0 but colors not found (test.ams)"
        );
    }

    #[test]
    fn test_ascii_face_with_zero_indices_fails() {
        let mesh = Mesh::new(vec![[0.0; 3]], vec![Vec::new()]);
        let err = decode(&encode(&mesh, false)).unwrap_err();
        assert!(matches!(err, MeshError::InvalidIndexCount { kind: "face", .. }));
    }

    #[test]
    fn test_truncated_binary_fails() {
        let mut bytes = encode(&sample(), true);
        bytes.truncate(bytes.len() - 6);
        let err = decode(&bytes).unwrap_err();
        assert!(matches!(err, MeshError::Parse { message, .. } if message == "unexpected end of file"));
    }

    #[test]
    fn test_bad_count_is_parse_error() {
        let err = decode(b"ams_mesh\nversion 1\nascii\nvertex_count -4\n").unwrap_err();
        assert!(matches!(err, MeshError::Parse { .. }));
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.ams");
        let mesh = sample();

        save(&mesh, &path, true).unwrap();
        assert_eq!(AmsMeshLoader.load(&path).unwrap(), mesh);

        // overwrite in ascii
        save(&mesh, &path, false).unwrap();
        assert_eq!(AmsMeshLoader.load(&path).unwrap(), mesh);
    }

    #[test]
    fn test_save_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("sample.ams");

        for binary in [true, false] {
            let err = save(&sample(), &path, binary).unwrap_err();
            assert!(matches!(err, MeshError::Io { path: ref failed, .. } if *failed == path));
        }
        assert!(!path.exists());
    }
}
