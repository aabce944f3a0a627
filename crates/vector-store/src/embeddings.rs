use crate::error::{Result, VectorStoreError};
use crate::similarity::is_finite;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Output widths are rounded up to this many lanes.
pub const EMBEDDING_ALIGNMENT: usize = 4;

/// Anything that can turn text into a fixed-width vector.
pub trait Embedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Width of every vector returned by [`Embedder::embed`].
    fn dimension(&self) -> usize;
}

/// Mean-pooled word-vector embedder backed by a static `word -> vector` table
/// (GloVe text format: `word f1 f2 ... fD` per line).
///
/// The table is read once and never mutated, so a single instance can be
/// shared across threads behind an `Arc`.
#[derive(Debug, Clone)]
pub struct EmbeddingModel {
    word_vectors: HashMap<String, Vec<f32>>,
    dimension: usize,
}

impl EmbeddingModel {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        log::info!("Loading word vectors from {path:?}");
        let file = File::open(path)?;
        let model = Self::from_reader(BufReader::new(file))?;
        log::info!(
            "Loaded {} word vectors (dimension {})",
            model.vocabulary_size(),
            model.dimension
        );
        Ok(model)
    }

    /// Parses a line-oriented word table. The width of the first line fixes
    /// the dimension; any other width or a non-numeric field (including
    /// `nan` and `inf`) is an error.
    pub fn from_reader(reader: impl BufRead) -> Result<Self> {
        let mut word_vectors = HashMap::new();
        let mut dimension = 0usize;

        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            let line_no = idx + 1;
            let mut parts = line.split_whitespace();
            let Some(word) = parts.next() else {
                continue;
            };

            let vector = parts
                .map(|raw| match raw.parse::<f32>() {
                    Ok(value) if value.is_finite() => Ok(value),
                    Ok(_) => Err(VectorStoreError::WordTable {
                        line: line_no,
                        message: format!("non-finite value '{raw}' for word '{word}'"),
                    }),
                    Err(err) => Err(VectorStoreError::WordTable {
                        line: line_no,
                        message: format!("invalid value '{raw}' for word '{word}': {err}"),
                    }),
                })
                .collect::<Result<Vec<f32>>>()?;

            if dimension == 0 {
                if vector.is_empty() {
                    return Err(VectorStoreError::WordTable {
                        line: line_no,
                        message: format!("word '{word}' has no vector components"),
                    });
                }
                dimension = vector.len();
            } else if vector.len() != dimension {
                return Err(VectorStoreError::WordTable {
                    line: line_no,
                    message: format!(
                        "word '{word}' has {} components, expected {dimension}",
                        vector.len()
                    ),
                });
            }

            word_vectors.insert(word.to_string(), vector);
        }

        if dimension == 0 {
            return Err(VectorStoreError::WordTable {
                line: 0,
                message: "word table is empty".to_string(),
            });
        }

        Ok(Self {
            word_vectors,
            dimension,
        })
    }

    /// Builds a model from an in-memory table.
    pub fn from_words<W, V>(words: impl IntoIterator<Item = (W, V)>) -> Result<Self>
    where
        W: Into<String>,
        V: Into<Vec<f32>>,
    {
        let mut word_vectors = HashMap::new();
        let mut dimension = 0usize;
        for (idx, (word, vector)) in words.into_iter().enumerate() {
            let word = word.into();
            let vector = vector.into();
            if dimension == 0 {
                dimension = vector.len();
            }
            if vector.is_empty() || vector.len() != dimension {
                return Err(VectorStoreError::WordTable {
                    line: idx + 1,
                    message: format!(
                        "word '{word}' has {} components, expected {dimension}",
                        vector.len()
                    ),
                });
            }
            if !is_finite(&vector) {
                return Err(VectorStoreError::WordTable {
                    line: idx + 1,
                    message: format!("word '{word}' has a non-finite component"),
                });
            }
            word_vectors.insert(word, vector);
        }

        if dimension == 0 {
            return Err(VectorStoreError::WordTable {
                line: 0,
                message: "word table is empty".to_string(),
            });
        }

        Ok(Self {
            word_vectors,
            dimension,
        })
    }

    /// Width of the vectors in the word table, before padding.
    pub const fn raw_dimension(&self) -> usize {
        self.dimension
    }

    pub fn vocabulary_size(&self) -> usize {
        self.word_vectors.len()
    }

    pub fn contains_word(&self, word: &str) -> bool {
        self.word_vectors.contains_key(word)
    }

    pub fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let lowered = text.to_lowercase();
        let mut words = lowered.split_whitespace().peekable();
        if words.peek().is_none() {
            return Err(VectorStoreError::EmptyInput);
        }

        // Summed in f64: the mean of finite f32 values is itself a finite f32.
        let mut sum = vec![0.0f64; self.dimension];
        let mut count = 0usize;
        for word in words {
            if let Some(vector) = self.word_vectors.get(word) {
                for (acc, v) in sum.iter_mut().zip(vector) {
                    *acc += f64::from(*v);
                }
                count += 1;
            }
        }

        if count == 0 {
            return Err(VectorStoreError::NoKnownWords);
        }

        let count = count as f64;
        let mut embedding: Vec<f32> = sum.into_iter().map(|acc| (acc / count) as f32).collect();
        embedding.resize(padded_dimension(self.dimension), 0.0);
        Ok(embedding)
    }

    /// Embeds every text, failing on the first one that cannot be embedded.
    pub fn embed_batch<'a>(
        &self,
        texts: impl IntoIterator<Item = &'a str>,
    ) -> Result<Vec<Vec<f32>>> {
        texts.into_iter().map(|text| self.embed(text)).collect()
    }
}

impl Embedder for EmbeddingModel {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Self::embed(self, text)
    }

    fn dimension(&self) -> usize {
        padded_dimension(self.dimension)
    }
}

/// Smallest multiple of [`EMBEDDING_ALIGNMENT`] that is `>= dimension`.
pub const fn padded_dimension(dimension: usize) -> usize {
    dimension.div_ceil(EMBEDDING_ALIGNMENT) * EMBEDDING_ALIGNMENT
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use pretty_assertions::assert_eq;

    const TABLE: &str = "hello 1.0 0.0 0.0 0.5 0.0\n\
                         world 0.0 1.0 0.0 0.5 0.0\n\
                         \n\
                         greetings 0.0 0.0 1.0 0.0 1.0\n\
                         friend 0.2 0.0 1.0 0.0 0.8\n";

    fn model() -> EmbeddingModel {
        EmbeddingModel::from_reader(TABLE.as_bytes()).unwrap()
    }

    #[test]
    fn parses_table_and_skips_blank_lines() {
        let model = model();
        assert_eq!(model.vocabulary_size(), 4);
        assert_eq!(model.raw_dimension(), 5);
        assert_eq!(Embedder::dimension(&model), 8);
        assert!(model.contains_word("friend"));
    }

    #[test]
    fn mean_pools_and_pads_to_alignment() {
        let embedding = model().embed("Hello WORLD").unwrap();
        assert_eq!(
            embedding,
            vec![0.5, 0.5, 0.0, 0.5, 0.0, 0.0, 0.0, 0.0]
        );
        assert_eq!(embedding.len() % EMBEDDING_ALIGNMENT, 0);
    }

    #[test]
    fn unknown_words_are_ignored_in_the_mean() {
        let model = model();
        let with_noise = model.embed("greetings earthling").unwrap();
        let plain = model.embed("greetings").unwrap();
        assert_eq!(with_noise, plain);
    }

    #[test]
    fn embedding_is_deterministic() {
        let model = model();
        let a = model.embed("hello greetings friend").unwrap();
        let b = model.embed("hello greetings friend").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn batch_matches_single_embeddings() {
        let model = model();
        let batch = model.embed_batch(["hello", "greetings friend"]).unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0], model.embed("hello").unwrap());
        assert_eq!(batch[1], model.embed("greetings friend").unwrap());

        let err = model.embed_batch(["hello", "zebra"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoKnownWords);
    }

    #[test]
    fn aligned_tables_are_not_padded() {
        let model = EmbeddingModel::from_words([("a", vec![1.0, 2.0, 3.0, 4.0])]).unwrap();
        assert_eq!(model.embed("a").unwrap(), vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn padded_dimension_rounds_up() {
        assert_eq!(padded_dimension(1), 4);
        assert_eq!(padded_dimension(4), 4);
        assert_eq!(padded_dimension(50), 52);
        assert_eq!(padded_dimension(300), 300);
    }

    #[test]
    fn empty_and_unknown_inputs_fail() {
        let model = model();
        assert_eq!(model.embed("").unwrap_err().kind(), ErrorKind::EmptyInput);
        assert_eq!(model.embed("  \t\n").unwrap_err().kind(), ErrorKind::EmptyInput);
        assert_eq!(
            model.embed("zebra quokka").unwrap_err().kind(),
            ErrorKind::NoKnownWords
        );
    }

    #[test]
    fn malformed_tables_are_rejected() {
        let err = EmbeddingModel::from_reader("a 1.0 2.0\nb 1.0 oops\n".as_bytes()).unwrap_err();
        assert!(matches!(err, VectorStoreError::WordTable { line: 2, .. }));

        let err = EmbeddingModel::from_reader("a 1.0 2.0\nb 1.0\n".as_bytes()).unwrap_err();
        assert!(matches!(err, VectorStoreError::WordTable { line: 2, .. }));

        let err = EmbeddingModel::from_reader("".as_bytes()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::WordTable);

        let err = EmbeddingModel::from_words([("a", vec![1.0]), ("b", vec![1.0, 2.0])]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::WordTable);
    }

    #[test]
    fn non_finite_table_values_are_rejected() {
        for bad in ["nan", "NaN", "inf", "-inf", "infinity", "1e39"] {
            let table = format!("hello 1 0 0 0\nbad {bad} 1 0 0\n");
            let err = EmbeddingModel::from_reader(table.as_bytes()).unwrap_err();
            assert!(
                matches!(err, VectorStoreError::WordTable { line: 2, .. }),
                "{bad}: {err}"
            );
        }

        let err = EmbeddingModel::from_words([("a", vec![1.0, f32::NAN])]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::WordTable);
    }

    #[test]
    fn large_components_average_without_overflow() {
        let model = EmbeddingModel::from_words([
            ("big", vec![f32::MAX, 1e20, 0.0, 0.0]),
            ("bigger", vec![f32::MAX, 1e20, 0.0, 0.0]),
        ])
        .unwrap();
        let embedding = model.embed("big bigger").unwrap();
        assert_eq!(embedding, vec![f32::MAX, 1e20, 0.0, 0.0]);
    }

    #[test]
    fn loads_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("words.txt");
        std::fs::write(&path, TABLE).unwrap();
        let model = EmbeddingModel::from_path(&path).unwrap();
        assert_eq!(model.vocabulary_size(), 4);

        let missing = EmbeddingModel::from_path(dir.path().join("missing.txt")).unwrap_err();
        assert_eq!(missing.kind(), ErrorKind::SerializationFailure);
    }
}
