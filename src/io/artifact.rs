//! Baked-artifact codec: section-tagged text files.
//!
//! Layout (AO):
//! ```text
//! Vertices
//! <x y z w>            per vertex: homogeneous position,
//! <nx ny nz>           bent normal,
//! <tx ty>              texcoord,
//! <occlusion>          unoccluded fraction
//! Elements
//! <index>              one triangle corner index per line
//! Textures
//! <ambient map>
//! <diffuse map>
//! <specular map>
//! <specular exponent>
//! ```
//!
//! The PRT layout starts with a `Bands <n>` header and replaces the
//! normal/texcoord/occlusion lines with n^2 three-float coefficient lines.
//!
//! Numbers are written with Rust's shortest round-trip float formatting,
//! so read(write(x)) reproduces arrays exactly. Array order is preserved;
//! it defines the vertex correspondence. Texture paths are opaque strings,
//! never checked for existence. A missing or truncated file fails with a
//! typed error and never yields partial data.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use nalgebra::{Vector2, Vector3, Vector4};
use thiserror::Error;

use crate::bake::{AoBakeResult, PrtBakeResult, PrtMode};
use crate::core::{Material, MeshData};

/// Errors raised while reading or writing a baked artifact.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("missing '{0}' section")]
    MissingSection(&'static str),

    #[error("invalid baked artifact: {0}")]
    Parse(String),
}

/// Derived filename for an AO bake of `mesh_path`.
pub fn ao_baked_path(mesh_path: &Path) -> PathBuf {
    let mut name = mesh_path.as_os_str().to_owned();
    name.push(".ao");
    PathBuf::from(name)
}

/// Derived filename for a PRT bake of `mesh_path` with the given mode and
/// band count.
pub fn prt_baked_path(mesh_path: &Path, mode: PrtMode, n_bands: usize) -> PathBuf {
    let mut name = mesh_path.as_os_str().to_owned();
    name.push(format!(".prt{}{}", mode.tag(), n_bands));
    PathBuf::from(name)
}

/// Persisted form of an AO bake: geometry, bake output and material refs.
#[derive(Debug, Clone, PartialEq)]
pub struct AoArtifact {
    pub positions: Vec<Vector4<f32>>,
    pub bent_normals: Vec<Vector3<f32>>,
    pub texcoords: Vec<Vector2<f32>>,
    pub occlusion: Vec<f32>,
    pub triangles: Vec<[u32; 3]>,
    pub material: Material,
}

impl AoArtifact {
    pub fn from_bake(mesh: &MeshData, result: &AoBakeResult, material: &Material) -> Self {
        Self {
            positions: mesh.positions.clone(),
            bent_normals: result.bent_normals.clone(),
            texcoords: mesh.texcoords.clone(),
            occlusion: result.occlusion.clone(),
            triangles: mesh.triangles.clone(),
            material: material.clone(),
        }
    }

    pub fn write(&self, path: &Path) -> Result<(), ArtifactError> {
        let mut file = File::create(path)?;

        writeln!(file, "Vertices")?;
        for i in 0..self.positions.len() {
            let p = self.positions[i];
            let n = self.bent_normals[i];
            let t = self.texcoords[i];
            writeln!(file, "{} {} {} {}", p.x, p.y, p.z, p.w)?;
            writeln!(file, "{} {} {}", n.x, n.y, n.z)?;
            writeln!(file, "{} {}", t.x, t.y)?;
            writeln!(file, "{}", self.occlusion[i])?;
        }

        writeln!(file, "Elements")?;
        for tri in &self.triangles {
            for idx in tri {
                writeln!(file, "{idx}")?;
            }
        }

        writeln!(file, "Textures")?;
        writeln!(file, "{}", self.material.ambient_map)?;
        writeln!(file, "{}", self.material.diffuse_map)?;
        writeln!(file, "{}", self.material.specular_map)?;
        writeln!(file, "{}", self.material.specular_exponent)?;

        Ok(())
    }

    pub fn read(path: &Path) -> Result<Self, ArtifactError> {
        let text = std::fs::read_to_string(path)?;
        let mut cursor = Cursor::new(&text);

        cursor.expect_section("Vertices")?;

        let mut positions = Vec::new();
        let mut bent_normals = Vec::new();
        let mut texcoords = Vec::new();
        let mut occlusion = Vec::new();
        while !cursor.at_tag("Elements") {
            let p = cursor.floats::<4>("vertex position")?;
            let n = cursor.floats::<3>("bent normal")?;
            let t = cursor.floats::<2>("texcoord")?;
            let o = cursor.floats::<1>("occlusion")?;
            positions.push(Vector4::new(p[0], p[1], p[2], p[3]));
            bent_normals.push(Vector3::new(n[0], n[1], n[2]));
            texcoords.push(Vector2::new(t[0], t[1]));
            occlusion.push(o[0]);
        }

        cursor.expect_section("Elements")?;
        let triangles = cursor.indices_until("Textures")?;

        cursor.expect_section("Textures")?;
        let material = cursor.material()?;

        Ok(Self {
            positions,
            bent_normals,
            texcoords,
            occlusion,
            triangles,
            material,
        })
    }
}

/// Persisted form of a PRT bake: positions, transfer vectors and material
/// refs, with the band count up front.
#[derive(Debug, Clone, PartialEq)]
pub struct PrtArtifact {
    pub n_bands: usize,
    pub positions: Vec<Vector4<f32>>,
    pub transfer: Vec<Vec<Vector3<f32>>>,
    pub triangles: Vec<[u32; 3]>,
    pub material: Material,
}

impl PrtArtifact {
    pub fn from_bake(mesh: &MeshData, result: &PrtBakeResult, material: &Material) -> Self {
        Self {
            n_bands: result.n_bands,
            positions: mesh.positions.clone(),
            transfer: result.transfer.clone(),
            triangles: mesh.triangles.clone(),
            material: material.clone(),
        }
    }

    pub fn write(&self, path: &Path) -> Result<(), ArtifactError> {
        let mut file = File::create(path)?;

        writeln!(file, "Bands {}", self.n_bands)?;
        writeln!(file, "Vertices")?;
        for (p, transfer) in self.positions.iter().zip(&self.transfer) {
            writeln!(file, "{} {} {} {}", p.x, p.y, p.z, p.w)?;
            for c in transfer {
                writeln!(file, "{} {} {}", c.x, c.y, c.z)?;
            }
        }

        writeln!(file, "Elements")?;
        for tri in &self.triangles {
            for idx in tri {
                writeln!(file, "{idx}")?;
            }
        }

        writeln!(file, "Textures")?;
        writeln!(file, "{}", self.material.ambient_map)?;
        writeln!(file, "{}", self.material.diffuse_map)?;
        writeln!(file, "{}", self.material.specular_map)?;
        writeln!(file, "{}", self.material.specular_exponent)?;

        Ok(())
    }

    pub fn read(path: &Path) -> Result<Self, ArtifactError> {
        let text = std::fs::read_to_string(path)?;
        let mut cursor = Cursor::new(&text);

        let header = cursor
            .next_line()
            .ok_or(ArtifactError::MissingSection("Bands"))?;
        let n_bands = header
            .strip_prefix("Bands ")
            .and_then(|n| n.parse::<usize>().ok())
            .ok_or_else(|| ArtifactError::Parse(format!("bad band header: {header:?}")))?;
        let n_coeffs = crate::core::n_coefficients(n_bands);

        cursor.expect_section("Vertices")?;
        let mut positions = Vec::new();
        let mut transfer = Vec::new();
        while !cursor.at_tag("Elements") {
            let p = cursor.floats::<4>("vertex position")?;
            positions.push(Vector4::new(p[0], p[1], p[2], p[3]));
            let mut coeffs = Vec::with_capacity(n_coeffs);
            for _ in 0..n_coeffs {
                let c = cursor.floats::<3>("transfer coefficient")?;
                coeffs.push(Vector3::new(c[0], c[1], c[2]));
            }
            transfer.push(coeffs);
        }

        cursor.expect_section("Elements")?;
        let triangles = cursor.indices_until("Textures")?;

        cursor.expect_section("Textures")?;
        let material = cursor.material()?;

        Ok(Self {
            n_bands,
            positions,
            transfer,
            triangles,
            material,
        })
    }
}

/// Line cursor over the artifact text.
struct Cursor<'a> {
    lines: std::iter::Peekable<std::str::Lines<'a>>,
}

impl<'a> Cursor<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            lines: text.lines().peekable(),
        }
    }

    fn next_line(&mut self) -> Option<&'a str> {
        self.lines.next()
    }

    /// True at end of input or when the next line equals `tag`.
    fn at_tag(&mut self, tag: &str) -> bool {
        match self.lines.peek() {
            None => true,
            Some(&line) => line == tag,
        }
    }

    fn expect_section(&mut self, tag: &'static str) -> Result<(), ArtifactError> {
        match self.lines.next() {
            Some(line) if line == tag => Ok(()),
            _ => Err(ArtifactError::MissingSection(tag)),
        }
    }

    /// Parse N whitespace-separated floats from the next line.
    fn floats<const N: usize>(&mut self, what: &str) -> Result<[f32; N], ArtifactError> {
        let line = self
            .next_line()
            .ok_or_else(|| ArtifactError::Parse(format!("truncated before {what}")))?;
        let mut out = [0.0f32; N];
        let mut fields = line.split_whitespace();
        for slot in &mut out {
            let field = fields
                .next()
                .ok_or_else(|| ArtifactError::Parse(format!("short {what} line: {line:?}")))?;
            *slot = field
                .parse()
                .map_err(|_| ArtifactError::Parse(format!("bad {what} value: {field:?}")))?;
        }
        if fields.next().is_some() {
            return Err(ArtifactError::Parse(format!(
                "trailing data on {what} line: {line:?}"
            )));
        }
        Ok(out)
    }

    /// Read one index per line until `stop` is seen; regroup into triples.
    fn indices_until(&mut self, stop: &str) -> Result<Vec<[u32; 3]>, ArtifactError> {
        let mut flat = Vec::new();
        while let Some(&line) = self.lines.peek() {
            if line == stop {
                break;
            }
            self.lines.next();
            let idx: u32 = line
                .trim()
                .parse()
                .map_err(|_| ArtifactError::Parse(format!("bad element index: {line:?}")))?;
            flat.push(idx);
        }
        if flat.len() % 3 != 0 {
            return Err(ArtifactError::Parse(format!(
                "element count {} is not a multiple of 3",
                flat.len()
            )));
        }
        Ok(flat.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect())
    }

    /// One texture path line.
    fn path_line(&mut self, what: &'static str) -> Result<String, ArtifactError> {
        self.next_line()
            .map(str::to_owned)
            .ok_or_else(|| ArtifactError::Parse(format!("truncated before {what}")))
    }

    fn material(&mut self) -> Result<Material, ArtifactError> {
        let ambient_map = self.path_line("ambient map")?;
        let diffuse_map = self.path_line("diffuse map")?;
        let specular_map = self.path_line("specular map")?;
        let exp = self.floats::<1>("specular exponent")?;
        Ok(Material {
            ambient_map,
            diffuse_map,
            specular_map,
            specular_exponent: exp[0],
        })
    }
}
