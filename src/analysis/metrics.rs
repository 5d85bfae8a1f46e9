//! Held-out evaluation of the classifier

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassReport {
    pub label: u8,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingMetrics {
    pub accuracy: f64,
    /// None when the held-out set lacks one of the classes.
    pub roc_auc: Option<f64>,
    pub per_class: Vec<ClassReport>,
    pub train_samples: usize,
    pub test_samples: usize,
}

impl TrainingMetrics {
    pub fn evaluate(
        labels: &[u8],
        probabilities: &[f64],
        train_samples: usize,
    ) -> TrainingMetrics {
        let predicted: Vec<u8> = probabilities
            .iter()
            .map(|p| if *p >= 0.5 { 1 } else { 0 })
            .collect();

        TrainingMetrics {
            accuracy: accuracy(labels, &predicted),
            roc_auc: roc_auc(labels, probabilities),
            per_class: vec![
                class_report(0, labels, &predicted),
                class_report(1, labels, &predicted),
            ],
            train_samples,
            test_samples: labels.len(),
        }
    }
}

impl fmt::Display for TrainingMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let auc = self
            .roc_auc
            .map(|a| format!("{:.2}", a))
            .unwrap_or_else(|| "n/a".to_string());
        write!(
            f,
            "Accuracy: {:.2} | ROC AUC: {} | train {} / test {}",
            self.accuracy, auc, self.train_samples, self.test_samples
        )
    }
}

pub fn accuracy(labels: &[u8], predicted: &[u8]) -> f64 {
    if labels.is_empty() {
        return 0.0;
    }
    let correct = labels.iter().zip(predicted).filter(|(a, b)| a == b).count();
    correct as f64 / labels.len() as f64
}

/// Area under the ROC curve via the rank-sum statistic, ties share ranks.
pub fn roc_auc(labels: &[u8], scores: &[f64]) -> Option<f64> {
    let positives = labels.iter().filter(|l| **l == 1).count();
    let negatives = labels.len() - positives;
    if positives == 0 || negatives == 0 {
        return None;
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].partial_cmp(&scores[b]).unwrap_or(Ordering::Equal));

    let mut ranks = vec![0.0; scores.len()];
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && scores[order[j + 1]] == scores[order[i]] {
            j += 1;
        }
        // 1-based average rank of the tie group
        let rank = (i + j) as f64 / 2.0 + 1.0;
        for k in i..=j {
            ranks[order[k]] = rank;
        }
        i = j + 1;
    }

    let positive_rank_sum: f64 = labels
        .iter()
        .zip(&ranks)
        .filter(|(l, _)| **l == 1)
        .map(|(_, r)| r)
        .sum();
    let p = positives as f64;
    let n = negatives as f64;
    Some((positive_rank_sum - p * (p + 1.0) / 2.0) / (p * n))
}

pub fn class_report(label: u8, labels: &[u8], predicted: &[u8]) -> ClassReport {
    let mut tp = 0usize;
    let mut fp = 0usize;
    let mut fn_ = 0usize;
    for (actual, guess) in labels.iter().zip(predicted) {
        match (*actual == label, *guess == label) {
            (true, true) => tp += 1,
            (false, true) => fp += 1,
            (true, false) => fn_ += 1,
            (false, false) => {}
        }
    }

    let precision = ratio(tp, tp + fp);
    let recall = ratio(tp, tp + fn_);
    let f1 = if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    };

    ClassReport {
        label,
        precision,
        recall,
        f1,
        support: tp + fn_,
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}
