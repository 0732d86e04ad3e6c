use crate::runner::EvaluationRun;

pub(crate) fn find_best_index_by_score(runs: &[EvaluationRun]) -> Option<usize> {
    runs.iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| {
            a.summary
                .overall_score
                .partial_cmp(&b.summary.overall_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|(idx, _)| idx)
}
