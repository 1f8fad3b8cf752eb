// ============================================================
// Layer 6 — Embedding Matrix Store
// ============================================================
// Builds the vocabulary-indexed embedding table from a static
// word-vector file (GloVe text format) and caches it on disk.
//
// Vector file format, one word per line:
//   <word> <f_1> <f_2> ... <f_dim>
// A handful of GloVe entries contain spaces inside the "word";
// the last `dim` fields are always the vector, everything before
// them is the word.
//
// Matrix layout:
//   row 0           → zeros (padding index)
//   row i (i ≥ 1)   → vector of the vocabulary token with index i,
//                     or zeros when the file has no vector for it
//
// Unknown words are deliberately left at zero instead of random
// noise. The number of all-zero rows is logged as a coverage check.
//
// Cache:
//   The finished matrix is written as a safetensors file holding a
//   single F32 tensor named "embedding_matrix". If the cache file
//   exists it is loaded as-is and the vector file is never opened.
//   The cache is keyed by filename only, so a cache built for a
//   different vocabulary is detected by its row count and rejected.
//
// Reference: safetensors crate documentation

use anyhow::{anyhow, bail, Context, Result};
use safetensors::{tensor::TensorView, Dtype, SafeTensors};
use std::{
    fs::{self, File},
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};

use crate::data::vocabulary::Vocabulary;

/// Name of the tensor inside the cache file.
pub const EMBEDDING_TENSOR_NAME: &str = "embedding_matrix";

/// Default pretrained vector file and cache file names.
pub const DEFAULT_VECTORS_FILE: &str = "glove.840B.300d.txt";
pub const DEFAULT_CACHE_FILE:   &str = "precomputed_glove.weights.safetensors";

// ─── EmbeddingMatrix ──────────────────────────────────────────────────────────
/// Dense row-major (rows × dim) table of f32.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingMatrix {
    rows:   usize,
    dim:    usize,
    values: Vec<f32>,
}

impl EmbeddingMatrix {
    pub fn zeros(rows: usize, dim: usize) -> Self {
        Self { rows, dim, values: vec![0.0; rows * dim] }
    }

    pub fn from_values(rows: usize, dim: usize, values: Vec<f32>) -> Result<Self> {
        if values.len() != rows * dim {
            bail!("Expected {} values for a {}x{} matrix, got {}", rows * dim, rows, dim, values.len());
        }
        Ok(Self { rows, dim, values })
    }

    pub fn rows(&self) -> usize { self.rows }

    pub fn dim(&self) -> usize { self.dim }

    #[cfg(test)]
    pub fn row(&self, index: usize) -> &[f32] {
        &self.values[index * self.dim..(index + 1) * self.dim]
    }

    fn row_mut(&mut self, index: usize) -> &mut [f32] {
        &mut self.values[index * self.dim..(index + 1) * self.dim]
    }

    /// Row-major values, ready to become a [rows, dim] tensor.
    pub fn values(&self) -> &[f32] { &self.values }

    /// Number of rows that are entirely zero.
    pub fn null_rows(&self) -> usize {
        self.values
            .chunks_exact(self.dim.max(1))
            .filter(|row| row.iter().all(|&v| v == 0.0))
            .count()
    }
}

// ─── EmbeddingStore ───────────────────────────────────────────────────────────
pub struct EmbeddingStore {
    vectors_path: PathBuf,
    cache_path:   PathBuf,
    dim:          usize,
}

impl EmbeddingStore {
    pub fn new(vectors_path: impl Into<PathBuf>, cache_path: impl Into<PathBuf>, dim: usize) -> Self {
        Self {
            vectors_path: vectors_path.into(),
            cache_path:   cache_path.into(),
            dim,
        }
    }

    /// Load the cached matrix, or build it from the vector file and cache it.
    pub fn load_or_build(&self, vocab: &Vocabulary) -> Result<EmbeddingMatrix> {
        let matrix = if self.cache_path.exists() {
            tracing::info!("Loading cached embedding matrix from '{}'", self.cache_path.display());
            let matrix = self.load_cache()?;
            if matrix.rows() != vocab.size() || matrix.dim() != self.dim {
                bail!(
                    "Cached embedding matrix '{}' is {}x{} but the vocabulary needs {}x{}; \
                     delete the cache file to rebuild it",
                    self.cache_path.display(),
                    matrix.rows(), matrix.dim(),
                    vocab.size(), self.dim,
                );
            }
            matrix
        } else {
            tracing::info!("Computing embedding matrix from '{}'", self.vectors_path.display());
            let matrix = self.build(vocab)?;
            self.save_cache(&matrix)?;
            matrix
        };

        tracing::info!("Total number of null word embeddings: {}", matrix.null_rows());
        Ok(matrix)
    }

    /// Stream the vector file and copy the vectors of vocabulary words
    /// into a zero matrix. Later duplicates of a word overwrite earlier ones.
    pub fn build(&self, vocab: &Vocabulary) -> Result<EmbeddingMatrix> {
        let file = File::open(&self.vectors_path).with_context(|| {
            format!("Cannot open word-vector file '{}'", self.vectors_path.display())
        })?;
        let mut reader = BufReader::new(file);

        let mut matrix    = EmbeddingMatrix::zeros(vocab.size(), self.dim);
        let mut found     = vec![false; vocab.size()];
        let mut malformed = 0usize;
        let mut buf       = Vec::new();
        let mut line_no   = 0usize;

        loop {
            buf.clear();
            let read = reader.read_until(b'\n', &mut buf).with_context(|| {
                format!("Cannot read '{}'", self.vectors_path.display())
            })?;
            if read == 0 {
                break;
            }
            line_no += 1;

            // A few lines in the large GloVe dumps are not valid UTF-8
            let line   = String::from_utf8_lossy(&buf);
            let fields: Vec<&str> = line.trim_end_matches(['\n', '\r']).split(' ').collect();
            if fields.len() < self.dim + 1 {
                malformed += 1;
                continue;
            }

            let split = fields.len() - self.dim;
            let word  = fields[..split].join(" ");
            let Some(index) = vocab.get(&word) else { continue };

            let row = matrix.row_mut(index as usize);
            for (slot, raw) in row.iter_mut().zip(&fields[split..]) {
                *slot = raw.parse().with_context(|| {
                    format!(
                        "Bad float '{raw}' for '{word}' on line {line_no} of '{}'",
                        self.vectors_path.display()
                    )
                })?;
            }
            found[index as usize] = true;
        }

        let mut missing = 0usize;
        for (word, index) in vocab.iter() {
            if !found[index as usize] {
                tracing::debug!("Missing from pretrained vectors: {}", word);
                missing += 1;
            }
        }
        if malformed > 0 {
            tracing::warn!("Skipped {} lines with fewer than {} values", malformed, self.dim);
        }
        tracing::info!(
            "{} of {} vocabulary words have no pretrained vector",
            missing,
            vocab.token_count()
        );

        Ok(matrix)
    }

    fn save_cache(&self, matrix: &EmbeddingMatrix) -> Result<()> {
        if let Some(parent) = self.cache_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let bytes: Vec<u8> = matrix.values().iter().flat_map(|v| v.to_le_bytes()).collect();
        let view = TensorView::new(Dtype::F32, vec![matrix.rows(), matrix.dim()], &bytes)
            .map_err(|e| anyhow!("Cannot describe embedding tensor: {e:?}"))?;

        safetensors::serialize_to_file([(EMBEDDING_TENSOR_NAME, view)], &None, &self.cache_path)
            .map_err(|e| anyhow!("Cannot write '{}': {e:?}", self.cache_path.display()))?;

        tracing::debug!("Cached embedding matrix to '{}'", self.cache_path.display());
        Ok(())
    }

    fn load_cache(&self) -> Result<EmbeddingMatrix> {
        load_matrix(&self.cache_path)
    }
}

/// Read an embedding matrix written by `EmbeddingStore`.
pub fn load_matrix(path: &Path) -> Result<EmbeddingMatrix> {
    let bytes = fs::read(path)
        .with_context(|| format!("Cannot read embedding cache '{}'", path.display()))?;
    let tensors = SafeTensors::deserialize(&bytes)
        .map_err(|e| anyhow!("Cannot parse embedding cache '{}': {e:?}", path.display()))?;
    let view = tensors
        .tensor(EMBEDDING_TENSOR_NAME)
        .map_err(|e| anyhow!("No '{EMBEDDING_TENSOR_NAME}' tensor in '{}': {e:?}", path.display()))?;

    let (rows, dim) = match (view.dtype(), view.shape()) {
        (Dtype::F32, &[rows, dim]) => (rows, dim),
        (dtype, shape) => bail!(
            "Embedding cache '{}' holds a {:?} tensor of shape {:?}, expected a 2-D F32 tensor",
            path.display(), dtype, shape
        ),
    };

    let values = view
        .data()
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect();
    EmbeddingMatrix::from_values(rows, dim, values)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn vectors_file(lines: &[&str]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for line in lines {
            writeln!(file, "{line}").unwrap();
        }
        file
    }

    fn vocab() -> Vocabulary {
        // man=1 dog=2 zebra=3
        Vocabulary::fit(["man dog zebra"])
    }

    #[test]
    fn test_rows_follow_vocabulary_indices() {
        let file  = vectors_file(&["dog 0.5 0.25 -1", "cat 9 9 9", "man 1 2 3"]);
        let store = EmbeddingStore::new(file.path(), "unused", 3);
        let m     = store.build(&vocab()).unwrap();

        assert_eq!((m.rows(), m.dim()), (4, 3));
        assert_eq!(m.row(0), &[0.0, 0.0, 0.0]);
        assert_eq!(m.row(1), &[1.0, 2.0, 3.0]);
        assert_eq!(m.row(2), &[0.5, 0.25, -1.0]);
        // zebra is absent from the file
        assert_eq!(m.row(3), &[0.0, 0.0, 0.0]);
        assert_eq!(m.null_rows(), 2);
    }

    #[test]
    fn test_values_are_copied_bit_for_bit() {
        let raw   = "0.123456789 -3.4028235e38 1e-45";
        let line  = format!("man {raw}");
        let file  = vectors_file(&[line.as_str()]);
        let store = EmbeddingStore::new(file.path(), "unused", 3);
        let m     = store.build(&vocab()).unwrap();

        let expected: Vec<f32> = raw.split(' ').map(|v| v.parse().unwrap()).collect();
        assert_eq!(m.row(1), expected.as_slice());
    }

    #[test]
    fn test_words_with_spaces_and_short_lines() {
        let vocab = Vocabulary::fit(["a b"]);
        let file  = vectors_file(&["a b 1 1", "a 2 2", "b 3"]);
        let store = EmbeddingStore::new(file.path(), "unused", 2);
        let m     = store.build(&vocab).unwrap();

        // "a b" is not a vocabulary word; "b 3" is too short
        assert_eq!(m.row(1), &[2.0, 2.0]);
        assert_eq!(m.row(2), &[0.0, 0.0]);
    }

    #[test]
    fn test_cache_round_trip_matches_fresh_build() {
        let dir   = tempfile::tempdir().unwrap();
        let cache = dir.path().join("cache.safetensors");
        let file  = vectors_file(&["man 1 2", "zebra -4 0.5"]);
        let store = EmbeddingStore::new(file.path(), &cache, 2);

        let built = store.load_or_build(&vocab()).unwrap();
        assert!(cache.exists());

        // Second call must come from the cache, even with the vector file gone
        drop(file);
        let cached = store.load_or_build(&vocab()).unwrap();
        assert_eq!(cached, built);
    }

    #[test]
    fn test_stale_cache_is_rejected() {
        let dir   = tempfile::tempdir().unwrap();
        let cache = dir.path().join("cache.safetensors");
        let file  = vectors_file(&["man 1 2"]);
        let store = EmbeddingStore::new(file.path(), &cache, 2);
        store.load_or_build(&vocab()).unwrap();

        let bigger = Vocabulary::fit(["man dog zebra horse"]);
        assert!(store.load_or_build(&bigger).is_err());
    }

    #[test]
    fn test_missing_vector_file_is_an_error() {
        let store = EmbeddingStore::new("no/such/vectors.txt", "no/such/cache", 3);
        assert!(store.build(&vocab()).is_err());
    }
}
