//! Tokenization of (question, context) pairs into fixed-length windows.

use qabench_core::Result;
use tokenizers::{Encoding, Tokenizer, TruncationParams, TruncationStrategy};
use tracing::trace;

/// One model input row: a question plus one slice of its context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Window {
    /// Index of the (question, context) pair this window belongs to.
    pub pair: usize,
    pub ids: Vec<i64>,
    pub attention_mask: Vec<i64>,
    pub type_ids: Vec<i64>,
    pub sequence_ids: Vec<Option<usize>>,
    pub offsets: Vec<(usize, usize)>,
}

impl Window {
    fn new(pair: usize, encoding: &Encoding, max_seq_len: usize, pad_id: u32) -> Self {
        Self {
            pair,
            ids: pad(encoding.get_ids(), max_seq_len, pad_id),
            attention_mask: pad(encoding.get_attention_mask(), max_seq_len, 0),
            type_ids: pad(encoding.get_type_ids(), max_seq_len, 0),
            sequence_ids: encoding.get_sequence_ids(),
            offsets: encoding.get_offsets().to_vec(),
        }
    }
}

/// Truncate only the context to `max_seq_len` tokens, overflowing into
/// windows that overlap by `doc_stride` tokens. Returns the pad token id.
///
/// # Errors
///
/// Returns an error if the tokenizer rejects the truncation settings.
pub fn configure(tokenizer: &mut Tokenizer, max_seq_len: usize, doc_stride: usize) -> Result<u32> {
    let pad_id = tokenizer.get_padding().map_or(0, |p| p.pad_id);
    tokenizer.with_padding(None);
    tokenizer
        .with_truncation(Some(TruncationParams {
            max_length: max_seq_len,
            stride: doc_stride,
            strategy: TruncationStrategy::OnlySecond,
            ..TruncationParams::default()
        }))
        .map_err(|e| eyre::eyre!(e))?;
    Ok(pad_id)
}

/// Encode every pair and flatten the main encoding plus its overflow into
/// padded windows, in pair order.
///
/// # Errors
///
/// Returns an error if any pair fails to encode.
pub fn windows(
    tokenizer: &Tokenizer,
    pairs: &[(&str, &str)],
    max_seq_len: usize,
    pad_id: u32,
) -> Result<Vec<Window>> {
    let mut windows = Vec::new();
    for (pair, &(question, context)) in pairs.iter().enumerate() {
        let encoding = tokenizer
            .encode((question, context), true)
            .map_err(|e| eyre::eyre!(e))?;
        let before = windows.len();
        for e in std::iter::once(&encoding).chain(encoding.get_overflowing()) {
            windows.push(Window::new(pair, e, max_seq_len, pad_id));
        }
        trace!(pair, windows = windows.len() - before, "pair encoded");
    }
    Ok(windows)
}

/// Right-pad (or cut) `values` to exactly `len` entries.
#[must_use]
pub fn pad(values: &[u32], len: usize, pad: u32) -> Vec<i64> {
    values
        .iter()
        .copied()
        .chain(std::iter::repeat(pad))
        .take(len)
        .map(i64::from)
        .collect()
}

/// Concatenate one field of every window into a row-major `[batch, seq]` buffer.
pub fn stack(batch: &[Window], field: impl Fn(&Window) -> &[i64]) -> Vec<i64> {
    batch.iter().flat_map(|w| field(w).iter().copied()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(pair: usize, ids: &[i64]) -> Window {
        Window {
            pair,
            ids: ids.to_vec(),
            attention_mask: vec![1; ids.len()],
            type_ids: vec![0; ids.len()],
            sequence_ids: vec![None; ids.len()],
            offsets: vec![(0, 0); ids.len()],
        }
    }

    #[test]
    fn pads_short_sequences() {
        assert_eq!(pad(&[101, 7, 102], 5, 0), [101, 7, 102, 0, 0]);
    }

    #[test]
    fn cuts_long_sequences() {
        assert_eq!(pad(&[1, 2, 3, 4], 2, 0), [1, 2]);
    }

    #[test]
    fn pads_with_tokenizer_pad_id() {
        assert_eq!(pad(&[5], 3, 1), [5, 1, 1]);
    }

    #[test]
    fn stacks_row_major() {
        let batch = [window(0, &[1, 2, 3]), window(1, &[4, 5, 6])];
        assert_eq!(stack(&batch, |w| w.ids.as_slice()), [1, 2, 3, 4, 5, 6]);
        assert_eq!(stack(&batch, |w| w.attention_mask.as_slice()), [1; 6]);
    }
}
