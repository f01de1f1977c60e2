//! Record and Field Management
//!
//! Holds the current input record, its fields, and the record counters.
//! Splitting and field edits keep the whole-record string and the field
//! list consistent in both directions: editing a field rebuilds `$0`
//! with `OFS`, and assigning `$0` re-splits on `FS`.

use lazy_static::lazy_static;
use regex_lite::Regex;

use crate::ast::types::Position;
use crate::interpreter::errors::EvalError;

lazy_static! {
    /// Splitter for the default field separator: runs of whitespace.
    static ref WHITESPACE_RUNS: Regex = Regex::new(r"[ \t\n]+").unwrap();
}

/// Split a line into fields for the given separator.
///
/// The single-space default has special semantics: leading and trailing
/// whitespace is stripped and the line splits on whitespace runs. A
/// single-character separator splits on that literal character. A longer
/// separator is a regular expression (falling back to a literal split
/// when it does not compile).
pub fn split_fields(line: &str, fs: &str) -> Vec<String> {
    if line.is_empty() {
        return Vec::new();
    }

    if fs == " " {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Vec::new();
        }
        return WHITESPACE_RUNS.split(trimmed).map(str::to_string).collect();
    }

    if fs.chars().count() == 1 {
        return line.split(fs).map(str::to_string).collect();
    }

    match Regex::new(fs) {
        Ok(re) => re.split(line).map(str::to_string).collect(),
        Err(_) => line.split(fs).map(str::to_string).collect(),
    }
}

/// The record manager: the current record, its fields, and the
/// `NR`/`FNR`/`NF`/`FILENAME` state.
#[derive(Debug, Default)]
pub struct RecordManager {
    lines: Vec<String>,
    cursor: usize,
    record: String,
    fields: Vec<String>,
    nr: usize,
    fnr: usize,
    filename: String,
}

impl RecordManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Point the manager at a new named line sequence. `FNR` resets,
    /// `NR` keeps counting across files. Advances to the first record
    /// when one is present (else the record becomes empty) and returns
    /// whether a record was loaded.
    pub fn open(&mut self, filename: &str, lines: Vec<String>, fs: &str) -> bool {
        self.lines = lines;
        self.cursor = 0;
        self.fnr = 0;
        self.filename = filename.to_string();
        if self.lines.is_empty() {
            self.split_and_assign("", fs);
            return false;
        }
        self.advance(fs)
    }

    /// Pull the next record: bump `NR`/`FNR`, split, and assign. Returns
    /// false at exhaustion, leaving the last record latched.
    pub fn advance(&mut self, fs: &str) -> bool {
        match self.pop_line() {
            Some(line) => {
                self.split_and_assign(&line, fs);
                true
            }
            None => false,
        }
    }

    /// Pull the next line raw, bumping `NR`/`FNR` but leaving the current
    /// record and fields untouched. Backs `getline var`.
    pub fn next_raw(&mut self) -> Option<String> {
        self.pop_line()
    }

    fn pop_line(&mut self) -> Option<String> {
        if self.cursor >= self.lines.len() {
            return None;
        }
        let line = self.lines[self.cursor].clone();
        self.cursor += 1;
        self.nr += 1;
        self.fnr += 1;
        Some(line)
    }

    /// Set `$0`, split on the current separator, and update `NF`.
    pub fn split_and_assign(&mut self, line: &str, fs: &str) {
        self.record = line.to_string();
        self.fields = split_fields(line, fs);
    }

    /// Read `$k`. `$0` is the whole record; 1..=NF are the fields.
    /// Negative indices and indices beyond `NF` are index errors.
    pub fn get_field(&self, index: i64, pos: Position) -> Result<String, EvalError> {
        if index < 0 {
            return Err(EvalError::index(
                pos,
                format!("field index {} is negative", index),
            ));
        }
        if index == 0 {
            return Ok(self.record.clone());
        }
        let idx = index as usize;
        if idx > self.fields.len() {
            return Err(EvalError::index(
                pos,
                format!("field {} is beyond NF={}", index, self.fields.len()),
            ));
        }
        Ok(self.fields[idx - 1].clone())
    }

    /// Write `$k`. `$0` re-splits; a field write rebuilds the record
    /// with `OFS`, growing the field list with empty fields when `k`
    /// exceeds `NF`.
    pub fn edit_field(
        &mut self,
        index: i64,
        value: &str,
        fs: &str,
        ofs: &str,
        pos: Position,
    ) -> Result<(), EvalError> {
        if index < 0 {
            return Err(EvalError::index(
                pos,
                format!("field index {} is negative", index),
            ));
        }
        if index == 0 {
            self.split_and_assign(value, fs);
            return Ok(());
        }
        let idx = index as usize;
        while self.fields.len() < idx {
            self.fields.push(String::new());
        }
        self.fields[idx - 1] = value.to_string();
        self.record = self.fields.join(ofs);
        Ok(())
    }

    /// Assigning `NF` truncates or extends the field list and rebuilds
    /// the record with `OFS`.
    pub fn set_nf(&mut self, nf: usize, ofs: &str) {
        if nf < self.fields.len() {
            self.fields.truncate(nf);
        } else {
            while self.fields.len() < nf {
                self.fields.push(String::new());
            }
        }
        self.record = self.fields.join(ofs);
    }

    pub fn record(&self) -> &str {
        &self.record
    }

    pub fn nf(&self) -> usize {
        self.fields.len()
    }

    pub fn nr(&self) -> usize {
        self.nr
    }

    pub fn set_nr(&mut self, nr: usize) {
        self.nr = nr;
    }

    pub fn fnr(&self) -> usize {
        self.fnr
    }

    pub fn set_fnr(&mut self, fnr: usize) {
        self.fnr = fnr;
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn set_filename(&mut self, filename: &str) {
        self.filename = filename.to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos() -> Position {
        Position::default()
    }

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    // ─── Splitting ───────────────────────────────────────────────

    #[test]
    fn test_split_default_fs() {
        assert_eq!(split_fields("a b c", " "), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_split_default_fs_trims_and_collapses() {
        assert_eq!(split_fields("  a \t b  ", " "), vec!["a", "b"]);
    }

    #[test]
    fn test_split_single_char_literal() {
        assert_eq!(split_fields("a,b,,c", ","), vec!["a", "b", "", "c"]);
        // A single-character separator is literal even when it is a
        // regex metacharacter
        assert_eq!(split_fields("a.b", "."), vec!["a", "b"]);
    }

    #[test]
    fn test_split_multi_char_regex() {
        assert_eq!(split_fields("a1b22c", "[0-9]+"), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_split_empty_line() {
        assert!(split_fields("", " ").is_empty());
        assert!(split_fields("", ",").is_empty());
    }

    #[test]
    fn test_split_whitespace_only_line() {
        assert!(split_fields("   ", " ").is_empty());
    }

    // ─── Record lifecycle ────────────────────────────────────────

    #[test]
    fn test_open_loads_first_record() {
        let mut records = RecordManager::new();
        assert!(records.open("data", lines(&["a b", "c d"]), " "));
        assert_eq!(records.record(), "a b");
        assert_eq!(records.nf(), 2);
        assert_eq!(records.nr(), 1);
        assert_eq!(records.fnr(), 1);
        assert_eq!(records.filename(), "data");
    }

    #[test]
    fn test_open_empty_source() {
        let mut records = RecordManager::new();
        assert!(!records.open("empty", vec![], " "));
        assert_eq!(records.record(), "");
        assert_eq!(records.nf(), 0);
        assert_eq!(records.nr(), 0);
    }

    #[test]
    fn test_advance_counts_and_exhausts() {
        let mut records = RecordManager::new();
        records.open("data", lines(&["one", "two"]), " ");
        assert!(records.advance(" "));
        assert_eq!(records.record(), "two");
        assert_eq!(records.nr(), 2);
        assert!(!records.advance(" "));
        // Last record stays latched after exhaustion
        assert_eq!(records.record(), "two");
        assert_eq!(records.nr(), 2);
    }

    #[test]
    fn test_reopen_resets_fnr_keeps_nr() {
        let mut records = RecordManager::new();
        records.open("first", lines(&["a", "b"]), " ");
        records.advance(" ");
        assert_eq!(records.nr(), 2);

        records.open("second", lines(&["c"]), " ");
        assert_eq!(records.nr(), 3);
        assert_eq!(records.fnr(), 1);
        assert_eq!(records.filename(), "second");
    }

    #[test]
    fn test_next_raw_keeps_record() {
        let mut records = RecordManager::new();
        records.open("data", lines(&["a b", "raw line"]), " ");
        let raw = records.next_raw();
        assert_eq!(raw.as_deref(), Some("raw line"));
        assert_eq!(records.record(), "a b");
        assert_eq!(records.nf(), 2);
        assert_eq!(records.nr(), 2);
    }

    // ─── Field access ────────────────────────────────────────────

    #[test]
    fn test_get_field_zero_and_fields() {
        let mut records = RecordManager::new();
        records.split_and_assign("x y z", " ");
        assert_eq!(records.get_field(0, pos()).unwrap(), "x y z");
        assert_eq!(records.get_field(1, pos()).unwrap(), "x");
        assert_eq!(records.get_field(3, pos()).unwrap(), "z");
    }

    #[test]
    fn test_get_field_beyond_nf_errors() {
        let mut records = RecordManager::new();
        records.split_and_assign("x y", " ");
        let err = records.get_field(3, pos()).unwrap_err();
        assert!(matches!(err, EvalError::Index { .. }));
    }

    #[test]
    fn test_get_field_negative_errors() {
        let records = RecordManager::new();
        assert!(records.get_field(-1, pos()).is_err());
    }

    // ─── Field edits ─────────────────────────────────────────────

    #[test]
    fn test_edit_field_rebuilds_record() {
        let mut records = RecordManager::new();
        records.split_and_assign("hello world", " ");
        records.edit_field(1, "goodbye", " ", " ", pos()).unwrap();
        assert_eq!(records.record(), "goodbye world");
    }

    #[test]
    fn test_edit_field_zero_resplits() {
        let mut records = RecordManager::new();
        records.split_and_assign("hello world", " ");
        records.edit_field(0, "a b c", " ", " ", pos()).unwrap();
        assert_eq!(records.nf(), 3);
        assert_eq!(records.get_field(2, pos()).unwrap(), "b");
    }

    #[test]
    fn test_edit_field_beyond_nf_grows() {
        let mut records = RecordManager::new();
        records.split_and_assign("a b", " ");
        records.edit_field(4, "d", " ", " ", pos()).unwrap();
        assert_eq!(records.nf(), 4);
        assert_eq!(records.get_field(3, pos()).unwrap(), "");
        assert_eq!(records.record(), "a b  d");
    }

    #[test]
    fn test_edit_field_uses_ofs() {
        let mut records = RecordManager::new();
        records.split_and_assign("a b", " ");
        records.edit_field(2, "B", " ", "-", pos()).unwrap();
        assert_eq!(records.record(), "a-B");
    }

    #[test]
    fn test_set_nf_truncates() {
        let mut records = RecordManager::new();
        records.split_and_assign("a b c d", " ");
        records.set_nf(2, " ");
        assert_eq!(records.record(), "a b");
        assert_eq!(records.nf(), 2);
    }

    #[test]
    fn test_set_nf_extends() {
        let mut records = RecordManager::new();
        records.split_and_assign("a b", " ");
        records.set_nf(4, " ");
        assert_eq!(records.nf(), 4);
        assert_eq!(records.record(), "a b  ");
    }

    #[test]
    fn test_field_join_roundtrip_single_char_fs() {
        // With a literal one-character separator, joining the fields
        // with it reconstructs the record
        let mut records = RecordManager::new();
        records.split_and_assign("a,b,,c", ",");
        let joined: Vec<String> = (1..=records.nf())
            .map(|i| records.get_field(i as i64, pos()).unwrap())
            .collect();
        assert_eq!(joined.join(","), "a,b,,c");
    }
}
