//! Per-class precision / recall / F1 on a held-out split.
use std::fmt;

/// Scores for one class.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassScores {
    pub label: String,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Text-renderable evaluation summary. Diagnostic only.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationReport {
    pub classes: Vec<ClassScores>,
    pub accuracy: f64,
    pub macro_avg: (f64, f64, f64),
    pub weighted_avg: (f64, f64, f64),
    pub total: usize,
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

fn f1(precision: f64, recall: f64) -> f64 {
    if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    }
}

impl ClassificationReport {
    /// Builds the report from class ids; `labels[id]` names class `id`.
    /// Undefined ratios (no predictions or no support) score 0.
    pub fn new(y_true: &[usize], y_pred: &[usize], labels: &[String]) -> Self {
        let n_classes = labels.len();
        let mut true_pos = vec![0usize; n_classes];
        let mut predicted = vec![0usize; n_classes];
        let mut support = vec![0usize; n_classes];

        for (&t, &p) in y_true.iter().zip(y_pred) {
            if t < n_classes {
                support[t] += 1;
            }
            if p < n_classes {
                predicted[p] += 1;
            }
            if t == p && t < n_classes {
                true_pos[t] += 1;
            }
        }

        let classes: Vec<ClassScores> = (0..n_classes)
            .map(|c| {
                let precision = ratio(true_pos[c], predicted[c]);
                let recall = ratio(true_pos[c], support[c]);
                ClassScores {
                    label: labels[c].clone(),
                    precision,
                    recall,
                    f1: f1(precision, recall),
                    support: support[c],
                }
            })
            .collect();

        let total = y_true.len().min(y_pred.len());
        let correct: usize = true_pos.iter().sum();

        let macro_avg = if n_classes == 0 {
            (0.0, 0.0, 0.0)
        } else {
            let k = n_classes as f64;
            (
                classes.iter().map(|c| c.precision).sum::<f64>() / k,
                classes.iter().map(|c| c.recall).sum::<f64>() / k,
                classes.iter().map(|c| c.f1).sum::<f64>() / k,
            )
        };

        let supported: usize = support.iter().sum();
        let weighted_avg = if supported == 0 {
            (0.0, 0.0, 0.0)
        } else {
            let w = |score: fn(&ClassScores) -> f64| {
                classes
                    .iter()
                    .map(|c| score(c) * c.support as f64)
                    .sum::<f64>()
                    / supported as f64
            };
            (w(|c| c.precision), w(|c| c.recall), w(|c| c.f1))
        };

        Self {
            classes,
            accuracy: ratio(correct, total),
            macro_avg,
            weighted_avg,
            total,
        }
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .classes
            .iter()
            .map(|c| c.label.len())
            .chain(std::iter::once("weighted avg".len()))
            .max()
            .unwrap_or(0);

        writeln!(
            f,
            "{:>width$} {:>9} {:>9} {:>9} {:>9}",
            "", "precision", "recall", "f1-score", "support",
            width = width
        )?;
        writeln!(f)?;
        for c in &self.classes {
            writeln!(
                f,
                "{:>width$} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                c.label, c.precision, c.recall, c.f1, c.support,
                width = width
            )?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>width$} {:>9} {:>9} {:>9.2} {:>9}",
            "accuracy", "", "", self.accuracy, self.total,
            width = width
        )?;
        let (p, r, f1) = self.macro_avg;
        writeln!(
            f,
            "{:>width$} {:>9.2} {:>9.2} {:>9.2} {:>9}",
            "macro avg", p, r, f1, self.total,
            width = width
        )?;
        let (p, r, f1) = self.weighted_avg;
        write!(
            f,
            "{:>width$} {:>9.2} {:>9.2} {:>9.2} {:>9}",
            "weighted avg", p, r, f1, self.total,
            width = width
        )
    }
}
