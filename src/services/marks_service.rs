use serde::Serialize;

/// Largest paper a single request may ask for.
pub const MAX_TOTAL_MARKS: u32 = 200;

/// Theory papers: (marks per question, word limit), filled greedily in this order.
pub const THEORY_DISTRIBUTION: [(u32, u32); 4] = [(4, 150), (8, 250), (2, 60), (1, 30)];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MarksBucket {
    pub count: u32,
    pub marks: u32,
    pub word_limit: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarksPlan {
    pub buckets: Vec<MarksBucket>,
    pub requested_marks: u32,
}

impl MarksPlan {
    pub fn planned_marks(&self) -> u32 {
        self.buckets.iter().map(|b| b.count * b.marks).sum()
    }

    pub fn question_count(&self) -> u32 {
        self.buckets.iter().map(|b| b.count).sum()
    }

    /// Marks that fit no bucket. They are dropped, not redistributed.
    pub fn shortfall(&self) -> u32 {
        self.requested_marks - self.planned_marks()
    }
}

/// Greedy fill in table order. Buckets with zero questions are kept so the plan
/// mirrors the table.
pub fn allocate(total_marks: u32, distribution: &[(u32, u32)]) -> MarksPlan {
    let mut remaining = total_marks;
    let buckets = distribution
        .iter()
        .filter(|(marks, _)| *marks > 0)
        .map(|&(marks, word_limit)| {
            let count = remaining / marks;
            remaining -= count * marks;
            MarksBucket {
                count,
                marks,
                word_limit: Some(word_limit),
            }
        })
        .collect();

    MarksPlan {
        buckets,
        requested_marks: total_marks,
    }
}

/// MCQ papers use one bucket; truncating division drops the remainder.
pub fn allocate_mcq(total_marks: u32, marks_per_question: u32) -> MarksPlan {
    let marks = marks_per_question.max(1);
    MarksPlan {
        buckets: vec![MarksBucket {
            count: total_marks / marks,
            marks,
            word_limit: None,
        }],
        requested_marks: total_marks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ten_marks_fill_four_then_two() {
        let plan = allocate(10, &THEORY_DISTRIBUTION);
        let counts: Vec<(u32, u32)> = plan.buckets.iter().map(|b| (b.marks, b.count)).collect();
        assert_eq!(counts, vec![(4, 2), (8, 0), (2, 1), (1, 0)]);
        assert_eq!(plan.planned_marks(), 10);
        assert_eq!(plan.shortfall(), 0);
        assert_eq!(plan.question_count(), 3);
        assert_eq!(plan.buckets[0].word_limit, Some(150));
    }

    #[test]
    fn remainder_too_small_for_any_bucket_is_dropped() {
        let plan = allocate(7, &[(4, 150), (2, 60)]);
        assert_eq!(plan.planned_marks(), 6);
        assert_eq!(plan.shortfall(), 1);
    }

    #[test]
    fn one_mark_bucket_absorbs_everything_left() {
        let plan = allocate(15, &THEORY_DISTRIBUTION);
        // 3 x 4 = 12, then 8 does not fit in 3, 1 x 2, 1 x 1
        let counts: Vec<u32> = plan.buckets.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![3, 0, 1, 1]);
        assert_eq!(plan.planned_marks(), 15);
    }

    #[test]
    fn mcq_plan_truncates() {
        let plan = allocate_mcq(10, 3);
        assert_eq!(
            plan.buckets,
            vec![MarksBucket {
                count: 3,
                marks: 3,
                word_limit: None
            }]
        );
        assert_eq!(plan.shortfall(), 1);
    }

    #[test]
    fn mcq_marks_larger_than_total_plans_nothing() {
        let plan = allocate_mcq(2, 5);
        assert_eq!(plan.question_count(), 0);
        assert_eq!(plan.shortfall(), 2);
    }
}
