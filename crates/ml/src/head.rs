//! Span-extraction prediction head over start/end logits.

/// Longest answer considered, in tokens.
pub const MAX_ANSWER_TOKENS: usize = 30;

/// Sequence id of the context in a (question, context) encoding.
const CONTEXT_SEQUENCE: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Span {
    pub start_token: usize,
    pub end_token: usize,
    pub score: f32,
}

/// Highest scoring span whose tokens all lie in the context.
#[must_use]
pub fn best_span(
    start_logits: &[f32],
    end_logits: &[f32],
    sequence_ids: &[Option<usize>],
) -> Option<Span> {
    let len = start_logits.len().min(end_logits.len()).min(sequence_ids.len());
    let in_context = |i: usize| sequence_ids[i] == Some(CONTEXT_SEQUENCE);

    let mut best: Option<Span> = None;
    for start_token in (0..len).filter(|&i| in_context(i)) {
        let last = (start_token + MAX_ANSWER_TOKENS).min(len);
        for end_token in start_token..last {
            if !in_context(end_token) {
                break;
            }
            let score = start_logits[start_token] + end_logits[end_token];
            if best.is_none_or(|b| score > b.score) {
                best = Some(Span {
                    start_token,
                    end_token,
                    score,
                });
            }
        }
    }
    best
}

/// Byte range and text of `span` in `context`, using per-token offsets.
#[must_use]
pub fn answer<'a>(
    context: &'a str,
    offsets: &[(usize, usize)],
    span: &Span,
) -> Option<(usize, usize, &'a str)> {
    let (start, _) = *offsets.get(span.start_token)?;
    let (_, end) = *offsets.get(span.end_token)?;
    context.get(start..end).map(|text| (start, end, text))
}

#[cfg(test)]
mod tests {
    use super::*;

    // [CLS] who ? [SEP] paris is big [SEP]
    fn sequence_ids() -> Vec<Option<usize>> {
        vec![None, Some(0), Some(0), None, Some(1), Some(1), Some(1), None]
    }

    #[test]
    fn picks_highest_context_span() {
        let start = [9.0, 9.0, 0.0, 0.0, 5.0, 1.0, 0.0, 0.0];
        let end = [9.0, 0.0, 9.0, 0.0, 1.0, 2.0, 4.0, 9.0];
        let span = best_span(&start, &end, &sequence_ids()).unwrap();
        assert_eq!((span.start_token, span.end_token), (4, 6));
        assert!((span.score - 9.0).abs() < f32::EPSILON);
    }

    #[test]
    fn never_crosses_out_of_context() {
        let start = [0.0; 8];
        let mut end = [0.0; 8];
        end[7] = 100.0;
        let span = best_span(&start, &end, &sequence_ids()).unwrap();
        assert!(span.end_token <= 6);
    }

    #[test]
    fn no_context_tokens_no_span() {
        let ids = [None, Some(0), None];
        assert!(best_span(&[1.0; 3], &[1.0; 3], &ids).is_none());
    }

    #[test]
    fn caps_answer_length() {
        let n = MAX_ANSWER_TOKENS + 10;
        let ids = vec![Some(CONTEXT_SEQUENCE); n];
        let mut start = vec![0.0; n];
        let mut end = vec![0.0; n];
        start[0] = 10.0;
        end[n - 1] = 10.0;
        let span = best_span(&start, &end, &ids).unwrap();
        assert!(span.end_token - span.start_token < MAX_ANSWER_TOKENS);
    }

    #[test]
    fn answer_slices_context() {
        let context = "paris is big";
        let offsets = [(0, 0), (0, 3), (4, 5), (0, 0), (0, 5), (6, 8), (9, 12), (0, 0)];
        let span = Span {
            start_token: 4,
            end_token: 6,
            score: 1.0,
        };
        assert_eq!(answer(context, &offsets, &span), Some((0, 12, "paris is big")));
    }

    #[test]
    fn answer_out_of_range() {
        let span = Span {
            start_token: 3,
            end_token: 9,
            score: 0.0,
        };
        assert!(answer("abc", &[(0, 1)], &span).is_none());
    }
}
