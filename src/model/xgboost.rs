//! XGBoost JSON model loading and tree-ensemble inference
//!
//! Only the parts of the JSON schema needed for inference are read:
//!
//! ```text
//! learner.learner_model_param.{base_score, num_feature}
//! learner.objective.name
//! learner.gradient_booster.model.trees[*].{left_children, right_children,
//!     split_indices, split_conditions, default_left, split_type}
//! ```
//!
//! Leaf nodes have `left_children[i] == -1` and store their weight in
//! `split_conditions[i]`.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::Regressor;
use crate::{FeatureVector, LarvaError, Result};

// ---------------------------------------------------------------------------
// On-disk schema
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ModelFile {
    learner: LearnerJson,
    #[serde(default)]
    version: Vec<u32>,
}

#[derive(Debug, Deserialize)]
struct LearnerJson {
    #[serde(default)]
    attributes: AttributesJson,
    #[serde(default)]
    feature_names: Vec<String>,
    gradient_booster: serde_json::Value,
    learner_model_param: LearnerModelParam,
    objective: ObjectiveJson,
}

/// XGBoost writes every model parameter as a string
#[derive(Debug, Deserialize)]
struct LearnerModelParam {
    base_score: String,
    num_feature: String,
}

/// Booster attributes set by the training run
#[derive(Debug, Default, Deserialize)]
struct AttributesJson {
    /// Written by early stopping; prediction stops after this round
    #[serde(default)]
    best_iteration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ObjectiveJson {
    name: String,
}

#[derive(Debug, Deserialize)]
struct GbtreeJson {
    model: GbtreeModelJson,
}

#[derive(Debug, Deserialize)]
struct GbtreeModelJson {
    #[serde(default)]
    gbtree_model_param: Option<GbtreeModelParam>,
    trees: Vec<TreeJson>,
}

#[derive(Debug, Deserialize)]
struct GbtreeModelParam {
    #[serde(default)]
    num_parallel_tree: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TreeJson {
    left_children: Vec<i32>,
    right_children: Vec<i32>,
    split_indices: Vec<i64>,
    split_conditions: Vec<f32>,
    default_left: Vec<Flag>,
    #[serde(default)]
    split_type: Vec<u8>,
}

/// `default_left` is `0/1` in older dumps and `true/false` in newer ones
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
enum Flag {
    Bool(bool),
    Int(i64),
}

impl Flag {
    fn is_set(self) -> bool {
        match self {
            Flag::Bool(b) => b,
            Flag::Int(i) => i != 0,
        }
    }
}

// ---------------------------------------------------------------------------
// In-memory model
// ---------------------------------------------------------------------------

/// Output transform applied to the summed margin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Objective {
    /// Squared error and friends: margin is the prediction
    Identity,
    /// `reg:logistic`
    Logistic,
    /// Log-link objectives (`reg:gamma`, `reg:tweedie`, `count:poisson`)
    Exp,
}

impl Objective {
    fn from_name(name: &str) -> Result<Self> {
        match name {
            "reg:squarederror" | "reg:linear" | "reg:squaredlogerror" | "reg:pseudohubererror"
            | "reg:absoluteerror" | "reg:quantileerror" => Ok(Objective::Identity),
            "reg:logistic" => Ok(Objective::Logistic),
            "reg:gamma" | "reg:tweedie" | "count:poisson" => Ok(Objective::Exp),
            other => Err(LarvaError::Model(format!(
                "unsupported objective '{}'",
                other
            ))),
        }
    }

    /// Convert `base_score` from prediction space to margin space
    fn base_margin(&self, base_score: f32) -> Result<f32> {
        match self {
            Objective::Identity => Ok(base_score),
            Objective::Logistic => {
                if !(base_score > 0.0 && base_score < 1.0) {
                    return Err(LarvaError::Model(format!(
                        "base_score {} must be in (0, 1) for reg:logistic",
                        base_score
                    )));
                }
                Ok((base_score / (1.0 - base_score)).ln())
            }
            Objective::Exp => {
                if base_score <= 0.0 {
                    return Err(LarvaError::Model(format!(
                        "base_score {} must be positive for a log-link objective",
                        base_score
                    )));
                }
                Ok(base_score.ln())
            }
        }
    }

    fn transform(&self, margin: f32) -> f32 {
        match self {
            Objective::Identity => margin,
            Objective::Logistic => 1.0 / (1.0 + (-margin).exp()),
            Objective::Exp => margin.exp(),
        }
    }
}

impl fmt::Display for Objective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Objective::Identity => write!(f, "identity"),
            Objective::Logistic => write!(f, "logistic"),
            Objective::Exp => write!(f, "exp"),
        }
    }
}

#[derive(Debug, Clone)]
struct Node {
    split_index: usize,
    split_condition: f32,
    left: usize,
    right: usize,
    default_left: bool,
    is_leaf: bool,
}

#[derive(Debug, Clone)]
struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    fn from_json(tree_id: usize, json: TreeJson, num_feature: usize) -> Result<Self> {
        let n = json.left_children.len();
        let bad = |message: String| LarvaError::Model(format!("tree {}: {}", tree_id, message));

        if n == 0 {
            return Err(bad("no nodes".to_string()));
        }
        if json.right_children.len() != n
            || json.split_indices.len() != n
            || json.split_conditions.len() != n
            || json.default_left.len() != n
        {
            return Err(bad("node arrays have different lengths".to_string()));
        }
        if json.split_type.iter().any(|&t| t != 0) {
            return Err(bad("categorical splits are not supported".to_string()));
        }

        let mut nodes = Vec::with_capacity(n);
        for i in 0..n {
            let left = json.left_children[i];
            let right = json.right_children[i];
            let is_leaf = left == -1;

            let node = if is_leaf {
                Node {
                    split_index: 0,
                    split_condition: json.split_conditions[i],
                    left: 0,
                    right: 0,
                    default_left: false,
                    is_leaf,
                }
            } else {
                // Children always come after their parent, which also rules out cycles
                let child = |c: i32| -> Result<usize> {
                    if c as i64 <= i as i64 || c as usize >= n {
                        return Err(bad(format!("node {} has invalid child {}", i, c)));
                    }
                    Ok(c as usize)
                };
                let split_index = json.split_indices[i];
                if split_index < 0 || split_index as usize >= num_feature {
                    return Err(bad(format!(
                        "node {} splits on feature {} but the model has {} features",
                        i, split_index, num_feature
                    )));
                }
                Node {
                    split_index: split_index as usize,
                    split_condition: json.split_conditions[i],
                    left: child(left)?,
                    right: child(right)?,
                    default_left: json.default_left[i].is_set(),
                    is_leaf,
                }
            };
            nodes.push(node);
        }

        Ok(Tree { nodes })
    }

    fn leaf_value(&self, features: &[f32]) -> f32 {
        let mut idx = 0;
        loop {
            let node = &self.nodes[idx];
            if node.is_leaf {
                return node.split_condition;
            }
            let x = features[node.split_index];
            let go_left = if x.is_nan() {
                node.default_left
            } else {
                x < node.split_condition
            };
            idx = if go_left { node.left } else { node.right };
        }
    }
}

/// Summary of a loaded model for display
#[derive(Debug, Clone, Serialize)]
pub struct ModelSummary {
    pub num_trees: usize,
    pub trees_used: usize,
    pub best_iteration: Option<usize>,
    pub num_features: usize,
    pub objective: Objective,
    pub base_score: f32,
    pub feature_names: Vec<String>,
    pub xgboost_version: Option<String>,
}

/// Gradient-boosted tree regressor loaded from an XGBoost JSON model
#[derive(Debug, Clone)]
pub struct XgbRegressor {
    trees: Vec<Tree>,
    num_feature: usize,
    objective: Objective,
    base_score: f32,
    base_margin: f32,
    /// Trees summed per prediction; fewer than `trees.len()` after early stopping
    tree_limit: usize,
    best_iteration: Option<usize>,
    feature_names: Vec<String>,
    version: Vec<u32>,
}

impl XgbRegressor {
    /// Load a model saved with `XGBRegressor.save_model("model.json")`
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            LarvaError::Model(format!("failed to read {}: {}", path.display(), e))
        })?;
        let model = Self::from_json_str(&content)?;

        log::info!(
            "Loaded XGBoost model from {} ({} trees, {} features, objective {})",
            path.display(),
            model.num_trees(),
            model.num_feature,
            model.objective
        );

        Ok(model)
    }

    /// Parse a model from its JSON text
    pub fn from_json_str(json: &str) -> Result<Self> {
        let file: ModelFile = serde_json::from_str(json)?;
        let learner = file.learner;

        let booster_name = learner
            .gradient_booster
            .get("name")
            .and_then(|n| n.as_str())
            .unwrap_or("");
        if booster_name != "gbtree" {
            return Err(LarvaError::Model(format!(
                "unsupported booster '{}', only gbtree is supported",
                booster_name
            )));
        }
        let booster: GbtreeJson = serde_json::from_value(learner.gradient_booster)?;

        let num_feature = parse_count("num_feature", &learner.learner_model_param.num_feature)?;
        let base_score = parse_base_score(&learner.learner_model_param.base_score)?;
        let objective = Objective::from_name(&learner.objective.name)?;
        let base_margin = objective.base_margin(base_score)?;

        let num_parallel_tree = match booster
            .model
            .gbtree_model_param
            .as_ref()
            .and_then(|p| p.num_parallel_tree.as_deref())
        {
            Some(raw) => parse_count("num_parallel_tree", raw)?.max(1),
            None => 1,
        };
        let best_iteration = learner
            .attributes
            .best_iteration
            .as_deref()
            .map(|raw| parse_count("best_iteration", raw))
            .transpose()?;

        let trees = booster
            .model
            .trees
            .into_iter()
            .enumerate()
            .map(|(i, t)| Tree::from_json(i, t, num_feature))
            .collect::<Result<Vec<_>>>()?;

        let tree_limit = match best_iteration {
            Some(best) => ((best + 1) * num_parallel_tree).min(trees.len()),
            None => trees.len(),
        };
        if tree_limit < trees.len() {
            log::debug!(
                "Early-stopped model: using {} of {} trees (best_iteration {})",
                tree_limit,
                trees.len(),
                best_iteration.unwrap_or_default()
            );
        }

        Ok(XgbRegressor {
            trees,
            num_feature,
            objective,
            base_score,
            base_margin,
            tree_limit,
            best_iteration,
            feature_names: learner.feature_names,
            version: file.version,
        })
    }

    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }

    /// Round chosen by early stopping, if the model was trained with it
    pub fn best_iteration(&self) -> Option<usize> {
        self.best_iteration
    }

    pub fn objective(&self) -> Objective {
        self.objective
    }

    pub fn base_score(&self) -> f32 {
        self.base_score
    }

    pub fn summary(&self) -> ModelSummary {
        let xgboost_version = if self.version.is_empty() {
            None
        } else {
            let parts: Vec<String> = self.version.iter().map(|v| v.to_string()).collect();
            Some(parts.join("."))
        };

        ModelSummary {
            num_trees: self.num_trees(),
            trees_used: self.tree_limit,
            best_iteration: self.best_iteration,
            num_features: self.num_feature,
            objective: self.objective,
            base_score: self.base_score,
            feature_names: self.feature_names.clone(),
            xgboost_version,
        }
    }

    /// Raw prediction for an arbitrary row, checked against the trained width
    pub fn predict_row(&self, row: &[f32]) -> Result<f32> {
        if row.len() != self.num_feature {
            return Err(LarvaError::Prediction(format!(
                "Feature shape mismatch, expected: {}, got {}",
                self.num_feature,
                row.len()
            )));
        }

        let margin = self.trees[..self.tree_limit]
            .iter()
            .fold(self.base_margin, |acc, tree| acc + tree.leaf_value(row));
        let value = self.objective.transform(margin);

        if !value.is_finite() {
            return Err(LarvaError::Prediction(format!(
                "model produced a non-finite prediction ({})",
                value
            )));
        }

        Ok(value)
    }
}

impl Regressor for XgbRegressor {
    fn predict(&self, features: &FeatureVector) -> Result<f32> {
        self.predict_row(features.as_slice())
    }

    fn num_features(&self) -> usize {
        self.num_feature
    }
}

fn parse_count(name: &str, raw: &str) -> Result<usize> {
    raw.trim()
        .parse()
        .map_err(|_| LarvaError::Model(format!("invalid {} '{}'", name, raw)))
}

/// `base_score` is written as `"5E-1"`, or `"[5E-1]"` by XGBoost 3
fn parse_base_score(raw: &str) -> Result<f32> {
    let trimmed = raw.trim().trim_start_matches('[').trim_end_matches(']');
    let first = trimmed.split(',').next().unwrap_or("").trim();
    first
        .parse::<f32>()
        .map_err(|_| LarvaError::Model(format!("invalid base_score '{}'", raw)))
}
