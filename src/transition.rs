use std::io::BufRead;

use crate::error::DecodableError;

/// Maps the decoder's one-based transition ids to zero-based pdf indices.
pub trait TransitionModel {
    fn num_transition_ids(&self) -> usize;

    /// Requires `id` in `[1, num_transition_ids()]`; callers check the range.
    fn transition_id_to_pdf(&self, id: usize) -> usize;
}

impl<T: TransitionModel + ?Sized> TransitionModel for &T {
    fn num_transition_ids(&self) -> usize {
        (**self).num_transition_ids()
    }

    fn transition_id_to_pdf(&self, id: usize) -> usize {
        (**self).transition_id_to_pdf(id)
    }
}

/// A flat transition-id to pdf table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionTable {
    // Entry `i` holds the pdf of transition id `i + 1`.
    pdfs: Vec<usize>,
}

impl TransitionTable {
    pub fn new(pdfs: Vec<usize>) -> Self {
        Self { pdfs }
    }

    /// Reads `<transition-id> <pdf>` lines. Ids must be one-based and
    /// contiguous; blank lines and lines starting with `#` are skipped.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, DecodableError> {
        let mut pdfs = Vec::new();
        for (lineno, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut fields = line.split_whitespace();
            let (Some(tid), Some(pdf), None) = (fields.next(), fields.next(), fields.next())
            else {
                return Err(DecodableError::Parse(format!(
                    "line {}: expected '<transition-id> <pdf>'",
                    lineno + 1
                )));
            };
            let parse = |s: &str| {
                s.parse::<usize>().map_err(|e| {
                    DecodableError::Parse(format!("line {}: '{s}': {e}", lineno + 1))
                })
            };
            let (tid, pdf) = (parse(tid)?, parse(pdf)?);
            if tid != pdfs.len() + 1 {
                return Err(DecodableError::Parse(format!(
                    "line {}: expected transition id {}, got {tid}",
                    lineno + 1,
                    pdfs.len() + 1
                )));
            }
            pdfs.push(pdf);
        }
        Ok(Self { pdfs })
    }

    /// One more than the largest pdf referenced.
    pub fn num_pdfs(&self) -> usize {
        self.pdfs.iter().max().map_or(0, |&p| p + 1)
    }
}

impl TransitionModel for TransitionTable {
    fn num_transition_ids(&self) -> usize {
        self.pdfs.len()
    }

    fn transition_id_to_pdf(&self, id: usize) -> usize {
        debug_assert!(
            (1..=self.pdfs.len()).contains(&id),
            "transition id {id} outside [1, {}]",
            self.pdfs.len()
        );
        self.pdfs[id - 1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_one_based() {
        let table = TransitionTable::new(vec![0, 0, 1, 2]);
        assert_eq!(table.num_transition_ids(), 4);
        assert_eq!(table.transition_id_to_pdf(1), 0);
        assert_eq!(table.transition_id_to_pdf(4), 2);
        assert_eq!(table.num_pdfs(), 3);
    }

    #[test]
    fn reads_text_table() {
        let text = "# tid pdf\n1 0\n2 1\n\n3 1\n";
        let table = TransitionTable::from_reader(text.as_bytes()).unwrap();
        assert_eq!(table, TransitionTable::new(vec![0, 1, 1]));
    }

    #[test]
    fn rejects_gaps_and_garbage() {
        assert!(TransitionTable::from_reader("1 0\n3 1\n".as_bytes()).is_err());
        assert!(TransitionTable::from_reader("1 x\n".as_bytes()).is_err());
        assert!(TransitionTable::from_reader("1 0 7\n".as_bytes()).is_err());
    }
}
