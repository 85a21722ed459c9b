// ============================================================
//  model.rs - Clasificatorul de bază și raportul de evaluare
// ============================================================
//
//  Clasificatorul consumă matricea X (lățime fixă) și vectorul y produse
//  de features.rs. Pipeline-ul nu depinde de implementare, doar de
//  trait-ul `Classifier`.
//
//  Implementarea inclusă: arbore de decizie CART (impuritate Gini),
//  antrenat pe 80% din rânduri și evaluat pe restul de 20%
//  (împărțire stratificată după etichetă, seed fix).
// ============================================================

use crate::config::ModelConfig;
use crate::features::FeatureSet;
use anyhow::{anyhow, bail, Context, Result};
use linfa::traits::{Fit, Predict};
use linfa::Dataset;
use linfa_trees::SplitQuality;
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::{debug, info, warn};

pub const CLASS_NAMES: [&str; 2] = ["Noise (0)", "Signal (1)"];

pub trait Classifier {
    fn fit(&mut self, x: &[Vec<f64>], y: &[u8]) -> Result<()>;

    fn predict(&self, x: &[Vec<f64>]) -> Result<Vec<u8>>;

    fn name(&self) -> &str;
}

// Matricea din features.rs are lățime fixă; un rând diferit e o eroare de programare
fn to_array(x: &[Vec<f64>]) -> Result<Array2<f64>> {
    let cols = x.first().map_or(0, Vec::len);
    let flat: Vec<f64> = x.iter().flatten().copied().collect();
    Array2::from_shape_vec((x.len(), cols), flat)
        .context("Matricea de feature-uri are rânduri de lățimi diferite")
}

// ---------------------------------------------------------------------------
// Arborele de decizie (CART, impuritate Gini) peste linfa-trees
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct DecisionTree {
    max_depth: Option<usize>,
    model:     Option<linfa_trees::DecisionTree<f64, usize>>,
}

impl DecisionTree {
    pub fn new(max_depth: Option<usize>) -> Self {
        DecisionTree { max_depth, model: None }
    }

    /// Adâncimea arborelui antrenat (0 = neantrenat).
    pub fn depth(&self) -> usize {
        self.model.as_ref().map_or(0, |m| m.max_depth())
    }
}

impl Classifier for DecisionTree {
    fn fit(&mut self, x: &[Vec<f64>], y: &[u8]) -> Result<()> {
        if x.is_empty() {
            bail!("Nu se poate antrena pe un set gol");
        }
        if x.len() != y.len() {
            bail!("X are {} rânduri, y are {}", x.len(), y.len());
        }

        let records = to_array(x)?;
        let targets: Array1<usize> = y.iter().map(|&label| usize::from(label)).collect();
        let dataset = Dataset::new(records, targets);

        let model = linfa_trees::DecisionTree::<f64, usize>::params()
            .split_quality(SplitQuality::Gini)
            .max_depth(self.max_depth)
            .fit(&dataset)
            .map_err(|e| anyhow!("Antrenarea arborelui de decizie a eșuat: {}", e))?;

        debug!(depth = model.max_depth(), leaves = model.num_leaves(), "arbore antrenat");
        self.model = Some(model);
        Ok(())
    }

    /// Un arbore neantrenat prezice 0 pentru orice rând.
    fn predict(&self, x: &[Vec<f64>]) -> Result<Vec<u8>> {
        let model = match &self.model {
            Some(model) if !x.is_empty() => model,
            _ => return Ok(vec![0; x.len()]),
        };

        let records = to_array(x)?;
        let predicted: Array1<usize> = model.predict(&records);
        Ok(predicted.iter().map(|&label| u8::from(label != 0)).collect())
    }

    fn name(&self) -> &str {
        "Decision Tree"
    }
}

// ---------------------------------------------------------------------------
// Împărțirea train/test
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct Split {
    pub x_train: Vec<Vec<f64>>,
    pub y_train: Vec<u8>,
    pub x_test:  Vec<Vec<f64>>,
    pub y_test:  Vec<u8>,
}

/// Împărțire stratificată: fiecare clasă contribuie la test cu aproximativ
/// `test_ratio` din rândurile ei (cel puțin unul dacă are minim două rânduri,
/// și mereu cel puțin unul rămâne în train). Ordinea originală se păstrează.
pub fn train_test_split(x: &[Vec<f64>], y: &[u8], test_ratio: f64, seed: u64) -> Split {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut is_test = vec![false; y.len()];

    for class in [0u8, 1u8] {
        let mut members: Vec<usize> = (0..y.len()).filter(|&i| y[i] == class).collect();
        let n = members.len();
        if n == 0 {
            continue;
        }

        let wanted = (n as f64 * test_ratio).round() as usize;
        let n_test = if n >= 2 { wanted.clamp(1, n - 1) } else { 0 };

        members.shuffle(&mut rng);
        for &i in members.iter().take(n_test) {
            is_test[i] = true;
        }
    }

    let mut split = Split::default();
    for (i, row) in x.iter().enumerate() {
        if is_test[i] {
            split.x_test.push(row.clone());
            split.y_test.push(y[i]);
        } else {
            split.x_train.push(row.clone());
            split.y_train.push(y[i]);
        }
    }
    split
}

// ---------------------------------------------------------------------------
// Raportul de evaluare
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall:    f64,
    pub f1:        f64,
    pub support:   usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    /// `confusion[actual][predicted]`, adică `[[tn, fp], [fn, tp]]`
    pub confusion: [[usize; 2]; 2],
    pub classes:   [ClassMetrics; 2],
    pub accuracy:  f64,
    pub total:     usize,
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

pub fn evaluate(y_true: &[u8], y_pred: &[u8]) -> Report {
    let mut confusion = [[0usize; 2]; 2];
    for (&actual, &predicted) in y_true.iter().zip(y_pred) {
        confusion[usize::from(actual.min(1))][usize::from(predicted.min(1))] += 1;
    }

    let mut classes = [ClassMetrics::default(); 2];
    for (c, metrics) in classes.iter_mut().enumerate() {
        let tp = confusion[c][c];
        let predicted = confusion[0][c] + confusion[1][c];
        let support = confusion[c][0] + confusion[c][1];

        let precision = ratio(tp, predicted);
        let recall = ratio(tp, support);
        let f1 = if precision + recall == 0.0 {
            0.0
        } else {
            2.0 * precision * recall / (precision + recall)
        };

        *metrics = ClassMetrics { precision, recall, f1, support };
    }

    let total: usize = confusion.iter().flatten().sum();
    let correct = confusion[0][0] + confusion[1][1];

    Report {
        confusion,
        classes,
        accuracy: ratio(correct, total),
        total,
    }
}

/// Antrenează pe partea de train și evaluează pe test.
///
/// Cu mai puțin de două rânduri sau cu o singură clasă prezentă nu există
/// nimic de învățat: se emite un avertisment și se întoarce `None`.
pub fn train_and_evaluate(
    classifier: &mut dyn Classifier,
    features: &FeatureSet,
    config: &ModelConfig,
) -> Result<Option<Report>> {
    let threats = features.threat_count();
    if features.len() < 2 || threats == 0 || threats == features.len() {
        warn!(
            rows = features.len(),
            threats,
            "date insuficiente pentru antrenare (e nevoie de ambele clase)"
        );
        return Ok(None);
    }

    let split = train_test_split(features.matrix(), features.labels(), config.test_ratio, config.seed);
    info!(
        model = classifier.name(),
        train = split.y_train.len(),
        test = split.y_test.len(),
        "antrenare model"
    );

    classifier.fit(&split.x_train, &split.y_train)?;
    let predictions = classifier.predict(&split.x_test)?;

    Ok(Some(evaluate(&split.y_test, &predictions)))
}
