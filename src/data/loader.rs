// ============================================================
// Layer 4 — SNLI Corpus Loader
// ============================================================
// Streams labelled sentence pairs out of the SNLI line-delimited
// JSON files. Each line is one record; only three fields matter:
//
//   {"gold_label": "neutral",
//    "sentence1_binary_parse": "( ( A man ) ( ... ) )",
//    "sentence2_binary_parse": "( ( He ) ( ... ) )", ...}
//
// The binary parses are flattened back into space-joined token
// strings by the parser module.
//
// Record limit:
//   The limit is compared against the zero-based line number
//   *before* the line is processed and reading stops once
//   `line > limit`. A limit of N therefore reads N + 1 lines.
//   Skipped "no majority" lines still count as lines.
//
// The corpus is restartable: every call to iter() reopens the
// file, so the same SnliCorpus can be walked any number of times.
//
// Reference: serde_json documentation
//            Rust Book §13 (Iterators)

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::{
    fs::File,
    io::{BufRead, BufReader, Lines},
    iter::Enumerate,
    path::PathBuf,
};

use crate::data::parser::sentence_text;
use crate::domain::example::{Example, Label};
use crate::domain::traits::ExampleSource;

/// The fields of an SNLI record this crate reads. Everything else
/// (pairID, captionID, annotator labels, ...) is ignored by serde.
#[derive(Debug, Deserialize)]
struct SnliRecord {
    gold_label:             String,
    sentence1_binary_parse: String,
    sentence2_binary_parse: String,
}

/// One SNLI split on disk.
#[derive(Debug, Clone)]
pub struct SnliCorpus {
    path:             PathBuf,
    skip_no_majority: bool,
    limit:            Option<usize>,
}

impl SnliCorpus {
    /// Corpus over `path` that skips "no majority" records and reads everything.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path:             path.into(),
            skip_no_majority: true,
            limit:            None,
        }
    }

    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    #[cfg(test)]
    pub fn with_skip_no_majority(mut self, skip: bool) -> Self {
        self.skip_no_majority = skip;
        self
    }

    /// Open the file and return a lazy iterator over its examples.
    pub fn iter(&self) -> Result<ExampleIter> {
        let file = File::open(&self.path)
            .with_context(|| format!("Cannot open corpus file '{}'", self.path.display()))?;
        Ok(ExampleIter {
            lines:            BufReader::new(file).lines().enumerate(),
            path:             self.path.clone(),
            skip_no_majority: self.skip_no_majority,
            limit:            self.limit,
            done:             false,
        })
    }
}

impl ExampleSource for SnliCorpus {
    fn load_all(&self) -> Result<Vec<Example>> {
        let examples = self.iter()?.collect::<Result<Vec<_>>>()?;

        // Diagnostic only: the longest sentences decide how much
        // the fixed sequence length truncates
        let (max_premise, max_hypothesis) = examples
            .iter()
            .map(Example::word_counts)
            .fold((0, 0), |(p, h), (ep, eh)| (p.max(ep), h.max(eh)));

        tracing::info!(
            "Loaded {} examples from '{}' (max premise length {}, max hypothesis length {})",
            examples.len(),
            self.path.display(),
            max_premise,
            max_hypothesis,
        );
        Ok(examples)
    }
}

/// Lazy iterator returned by `SnliCorpus::iter`.
pub struct ExampleIter {
    lines:            Enumerate<Lines<BufReader<File>>>,
    path:             PathBuf,
    skip_no_majority: bool,
    limit:            Option<usize>,
    done:             bool,
}

impl Iterator for ExampleIter {
    type Item = Result<Example>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            let (index, line) = self.lines.next()?;

            if matches!(self.limit, Some(limit) if index > limit) {
                self.done = true;
                break;
            }

            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    self.done = true;
                    return Some(Err(anyhow!(e).context(format!(
                        "Cannot read line {} of '{}'",
                        index + 1,
                        self.path.display()
                    ))));
                }
            };

            if line.trim().is_empty() {
                continue;
            }

            match parse_record(&line, self.skip_no_majority) {
                Ok(Some(example)) => return Some(Ok(example)),
                Ok(None)          => continue,
                Err(e) => {
                    self.done = true;
                    return Some(Err(e.context(format!(
                        "Malformed record on line {} of '{}'",
                        index + 1,
                        self.path.display()
                    ))));
                }
            }
        }
        None
    }
}

/// Parse one JSON line. Ok(None) means the record was filtered out.
fn parse_record(line: &str, skip_no_majority: bool) -> Result<Option<Example>> {
    let record: SnliRecord = serde_json::from_str(line)?;

    if skip_no_majority && record.gold_label == Label::NO_MAJORITY {
        return Ok(None);
    }

    let label = Label::from_gold(&record.gold_label)
        .ok_or_else(|| anyhow!("Unknown gold label '{}'", record.gold_label))?;

    Ok(Some(Example::new(
        label,
        sentence_text(&record.sentence1_binary_parse),
        sentence_text(&record.sentence2_binary_parse),
    )))
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn record(label: &str, s1: &str, s2: &str) -> String {
        serde_json::json!({
            "gold_label": label,
            "sentence1_binary_parse": s1,
            "sentence2_binary_parse": s2,
            "pairID": "ignored",
        })
        .to_string()
    }

    /// Five labelled records with one "no majority" record in the middle
    fn write_corpus() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let lines = [
            record("neutral",       "( ( A man ) sleeps )", "( He ( is tired ) )"),
            record("entailment",    "( A ( dog runs ) )",   "( ( An animal ) moves )"),
            record("contradiction", "( ( Kids ) play )",    "( ( Nobody ) plays )"),
            record("-",             "( No ( consensus ) )", "( ( at all ) )"),
            record("neutral",       "( ( -LRB- x -RRB- ) )", "( y )"),
            record("entailment",    "( ( A B ) ( C D ) )",  "( A B )"),
        ];
        for line in lines {
            writeln!(file, "{line}").unwrap();
        }
        file
    }

    #[test]
    fn test_skips_no_majority_records() {
        let file     = write_corpus();
        let examples = SnliCorpus::new(file.path()).load_all().unwrap();
        assert_eq!(examples.len(), 5);
    }

    #[test]
    fn test_limit_reads_one_extra_line() {
        let file     = write_corpus();
        let examples = SnliCorpus::new(file.path())
            .with_limit(Some(2))
            .load_all()
            .unwrap();
        assert_eq!(examples.len(), 3);
    }

    #[test]
    fn test_limit_counts_skipped_lines() {
        // Lines 0..=3 are read; line 3 is the "-" record
        let file     = write_corpus();
        let examples = SnliCorpus::new(file.path())
            .with_limit(Some(3))
            .load_all()
            .unwrap();
        assert_eq!(examples.len(), 3);
    }

    #[test]
    fn test_texts_are_flattened_parses() {
        let file     = write_corpus();
        let examples = SnliCorpus::new(file.path()).load_all().unwrap();
        assert_eq!(examples[0], Example::new(Label::Neutral, "A man sleeps", "He is tired"));
        assert_eq!(examples[3].premise, "( x )");
    }

    #[test]
    fn test_corpus_is_restartable() {
        let file   = write_corpus();
        let corpus = SnliCorpus::new(file.path());
        let first: Vec<_>  = corpus.iter().unwrap().collect::<Result<_>>().unwrap();
        let second: Vec<_> = corpus.iter().unwrap().collect::<Result<_>>().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_no_majority_is_an_error_without_skipping() {
        let file   = write_corpus();
        let result = SnliCorpus::new(file.path())
            .with_skip_no_majority(false)
            .load_all();
        assert!(result.is_err());
    }

    #[test]
    fn test_malformed_json_reports_line() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{}", record("neutral", "( a )", "( b )")).unwrap();
        writeln!(file, "{{not json").unwrap();
        let err = SnliCorpus::new(file.path()).load_all().unwrap_err();
        assert!(format!("{err:#}").contains("line 2"));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let result = SnliCorpus::new("does/not/exist.jsonl").load_all();
        assert!(result.is_err());
    }
}
