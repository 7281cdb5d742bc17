//! The Shanten Distance Table: for every reachable group sub-vector and every
//! target tile total, the minimum number of tiles still missing.
//!
//! The table is dense, one `[u8; 10]` row per base-5 index (see
//! [`pattern::encode`]), with one column per entry of [`TARGET_COUNTS`].
//! Rows of vectors holding more than 14 tiles are never looked up and stay
//! filled with [`UNSET`].
//!
//! # Artifact format
//!
//! ```text
//! {"suuhai": {"000000000": {"0": 0, "2": 2, ...}, ...},
//!  "zihai":  {"0000000":   {"0": 0, "2": 2, ...}, ...}}
//! ```
//!
//! Keys are the digit strings of the count vectors. Both levels are written
//! in ascending order, so two generations produce identical bytes. Paths
//! ending in `.gz` are gzip-compressed.

use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::time::Instant;

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use log::{debug, info};
use rayon::prelude::*;
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

use crate::errors::{EngineError, EngineResult};
use crate::pattern::{self, GroupKind, MAX_HAND_TILES, TARGET_COUNTS};

/// Marker for cells that hold no distance.
pub const UNSET: u8 = u8::MAX;

type Row = [u8; TARGET_COUNTS.len()];

// ---------------------------------------------------------------------------
// GroupTable
// ---------------------------------------------------------------------------

/// Distances for one lookup group (a number suit or the honors).
#[derive(Clone, PartialEq, Eq)]
pub struct GroupTable {
    kind: GroupKind,
    rows: Vec<Row>,
}

impl fmt::Debug for GroupTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroupTable")
            .field("kind", &self.kind)
            .field("rows", &self.rows.len())
            .finish()
    }
}

impl GroupTable {
    /// Enumerates the winning shapes of `kind` and runs one distance search
    /// per target total, in parallel.
    pub fn generate(kind: GroupKind) -> Self {
        let start = Instant::now();
        let patterns = pattern::win_patterns(kind);
        let columns: Vec<Vec<u8>> = TARGET_COUNTS
            .par_iter()
            .map(|count| {
                let column = match patterns.get(count) {
                    Some(targets) => pattern::distance_field(kind, targets),
                    None => vec![UNSET; kind.space_size()],
                };
                debug!("{:?} target {}: column ready", kind, count);
                column
            })
            .collect();

        let mut rows = vec![[UNSET; TARGET_COUNTS.len()]; kind.space_size()];
        for (index, _) in pattern::reachable_vectors(kind) {
            for (slot, column) in columns.iter().enumerate() {
                rows[index][slot] = column[index];
            }
        }
        info!(
            "generated {:?} distance table in {:.2?}",
            kind,
            start.elapsed()
        );
        Self { kind, rows }
    }

    pub fn kind(&self) -> GroupKind {
        self.kind
    }

    /// Distances of one sub-vector, one per target total.
    #[inline]
    pub fn row(&self, counts: &[u8]) -> &Row {
        &self.rows[pattern::encode(counts)]
    }

    /// Distance from `counts` to the closest shape holding `target` tiles.
    pub fn distance(&self, counts: &[u8], target: u8) -> Option<u8> {
        let slot = pattern::target_slot(target)?;
        let value = self.rows.get(pattern::encode(counts))?[slot];
        (value != UNSET).then_some(value)
    }

    /// Streams this group as the artifact's inner JSON object.
    pub fn write_json<W: Write>(&self, writer: W) -> EngineResult<()> {
        serde_json::to_writer(writer, &GroupView(self))?;
        Ok(())
    }

    pub fn read_json<R: Read>(kind: GroupKind, reader: R) -> EngineResult<Self> {
        let mut de = serde_json::Deserializer::from_reader(reader);
        let partial = (&mut de).deserialize_map(GroupVisitor(kind))?;
        de.end()?;
        partial.into_table()
    }
}

fn vector_key(index: usize, ranks: usize) -> String {
    pattern::decode(index, ranks)
        .into_iter()
        .map(|c| char::from(b'0' + c))
        .collect()
}

// ---------------------------------------------------------------------------
// Serialization
// ---------------------------------------------------------------------------

struct GroupView<'a>(&'a GroupTable);

struct RowView<'a>(&'a Row);

impl Serialize for RowView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(TARGET_COUNTS.len()))?;
        for (count, distance) in TARGET_COUNTS.iter().zip(self.0.iter()) {
            map.serialize_entry(count, distance)?;
        }
        map.end()
    }
}

impl Serialize for GroupView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let ranks = self.0.kind.ranks();
        let mut map = serializer.serialize_map(None)?;
        for (index, row) in self.0.rows.iter().enumerate() {
            if row[0] == UNSET {
                continue;
            }
            map.serialize_entry(&vector_key(index, ranks), &RowView(row))?;
        }
        map.end()
    }
}

#[derive(Serialize)]
struct ArtifactView<'a> {
    suuhai: GroupView<'a>,
    zihai: GroupView<'a>,
}

/// A group as read from an artifact, before the completeness check.
struct PartialGroup {
    kind: GroupKind,
    rows: Vec<Row>,
    problem: Option<String>,
}

impl PartialGroup {
    fn new(kind: GroupKind) -> Self {
        Self {
            kind,
            rows: vec![[UNSET; TARGET_COUNTS.len()]; kind.space_size()],
            problem: None,
        }
    }

    fn insert(&mut self, key: &str, targets: &BTreeMap<u8, u8>) {
        if self.problem.is_some() {
            return;
        }
        let digits: Option<Vec<u8>> = key
            .bytes()
            .map(|b| (b'0'..=b'4').contains(&b).then(|| b - b'0'))
            .collect();
        let counts = match digits {
            Some(d) if d.len() == self.kind.ranks() => d,
            _ => {
                self.problem = Some(format!("malformed {:?} key '{}'", self.kind, key));
                return;
            }
        };
        if counts.iter().sum::<u8>() > MAX_HAND_TILES {
            self.problem = Some(format!("key '{}' holds more than 14 tiles", key));
            return;
        }
        let row = &mut self.rows[pattern::encode(&counts)];
        for (&count, &distance) in targets {
            match pattern::target_slot(count) {
                Some(slot) if distance != UNSET => row[slot] = distance,
                _ => {
                    self.problem = Some(format!("key '{}' has bad target {} => {}", key, count, distance));
                    return;
                }
            }
        }
    }

    fn into_table(self) -> EngineResult<GroupTable> {
        if let Some(message) = self.problem {
            return Err(EngineError::DataIntegrity { message });
        }
        for (index, counts) in pattern::reachable_vectors(self.kind) {
            if let Some(slot) = self.rows[index].iter().position(|&d| d == UNSET) {
                return Err(EngineError::DataIntegrity {
                    message: format!(
                        "{:?} vector {:?} has no distance for target {}",
                        self.kind, counts, TARGET_COUNTS[slot]
                    ),
                });
            }
        }
        Ok(GroupTable {
            kind: self.kind,
            rows: self.rows,
        })
    }
}

struct GroupVisitor(GroupKind);

impl<'de> Visitor<'de> for GroupVisitor {
    type Value = PartialGroup;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "a map of {:?} count vectors to target distances", self.0)
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<PartialGroup, A::Error> {
        let mut partial = PartialGroup::new(self.0);
        while let Some((key, targets)) = map.next_entry::<String, BTreeMap<u8, u8>>()? {
            partial.insert(&key, &targets);
        }
        Ok(partial)
    }
}

fn number_group<'de, D: Deserializer<'de>>(d: D) -> Result<PartialGroup, D::Error> {
    d.deserialize_map(GroupVisitor(GroupKind::Number))
}

fn honor_group<'de, D: Deserializer<'de>>(d: D) -> Result<PartialGroup, D::Error> {
    d.deserialize_map(GroupVisitor(GroupKind::Honor))
}

#[derive(Deserialize)]
struct RawArtifact {
    #[serde(deserialize_with = "number_group")]
    suuhai: PartialGroup,
    #[serde(deserialize_with = "honor_group")]
    zihai: PartialGroup,
}

// ---------------------------------------------------------------------------
// ShantenTable
// ---------------------------------------------------------------------------

/// The complete table: one number-suit group shared by manzu, pinzu and
/// souzu, plus the honor group. Read-only once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShantenTable {
    number: GroupTable,
    honor: GroupTable,
}

impl ShantenTable {
    pub fn generate() -> Self {
        let start = Instant::now();
        let (number, honor) = rayon::join(
            || GroupTable::generate(GroupKind::Number),
            || GroupTable::generate(GroupKind::Honor),
        );
        info!("shanten table ready in {:.2?}", start.elapsed());
        Self { number, honor }
    }

    #[inline]
    pub fn number(&self) -> &GroupTable {
        &self.number
    }

    #[inline]
    pub fn honor(&self) -> &GroupTable {
        &self.honor
    }

    pub fn write_artifact<W: Write>(&self, writer: W) -> EngineResult<()> {
        let view = ArtifactView {
            suuhai: GroupView(&self.number),
            zihai: GroupView(&self.honor),
        };
        serde_json::to_writer(writer, &view)?;
        Ok(())
    }

    pub fn read_artifact<R: Read>(reader: R) -> EngineResult<Self> {
        let raw: RawArtifact = serde_json::from_reader(reader)?;
        Ok(Self {
            number: raw.suuhai.into_table()?,
            honor: raw.zihai.into_table()?,
        })
    }

    pub fn save(&self, path: &Path) -> EngineResult<()> {
        let start = Instant::now();
        let file = File::create(path).map_err(|e| io_error(path, e))?;
        let mut writer = BufWriter::new(file);
        if is_gzip(path) {
            let mut gz = GzEncoder::new(&mut writer, Compression::default());
            self.write_artifact(&mut gz)?;
            gz.finish().map_err(|e| io_error(path, e))?;
        } else {
            self.write_artifact(&mut writer)?;
        }
        writer.flush().map_err(|e| io_error(path, e))?;
        info!("saved shanten table to {} in {:.2?}", path.display(), start.elapsed());
        Ok(())
    }

    /// Loads and validates an artifact. A missing entry for any reachable
    /// vector is a [`EngineError::DataIntegrity`] error.
    pub fn load(path: &Path) -> EngineResult<Self> {
        let start = Instant::now();
        let file = File::open(path).map_err(|e| io_error(path, e))?;
        let reader = BufReader::new(file);
        let table = if is_gzip(path) {
            Self::read_artifact(GzDecoder::new(reader))?
        } else {
            Self::read_artifact(reader)?
        };
        info!("loaded shanten table from {} in {:.2?}", path.display(), start.elapsed());
        Ok(table)
    }

    /// Loads `path` when it exists, otherwise generates the table and caches
    /// it there. A corrupt artifact is reported, never regenerated over.
    pub fn load_or_generate(path: &Path) -> EngineResult<Self> {
        if path.exists() {
            return Self::load(path);
        }
        info!("no shanten table at {}, generating", path.display());
        let table = Self::generate();
        table.save(path)?;
        Ok(table)
    }
}

fn is_gzip(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "gz")
}

fn io_error(path: &Path, err: std::io::Error) -> EngineError {
    EngineError::Io {
        path: path.display().to_string(),
        message: err.to_string(),
    }
}
