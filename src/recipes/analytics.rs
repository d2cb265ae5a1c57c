//! Chart data for the recipe analytics page.
//!
//! Produces the labelled series a chart would plot. Rendering is left to
//! whoever consumes [`ChartData`].

use super::model::Recipe;
use crate::core::{CatalogError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

pub const TOP_INGREDIENTS: usize = 10;
pub const HISTOGRAM_BINS: usize = 10;
pub const COOKING_TIME_RANGES: [&str; 5] = ["0-60", "61-120", "121-180", "181-240", "241+"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisType {
    Ingredients,
    Difficulty,
    CookingTime,
}

impl AnalysisType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ingredients => "ingredients",
            Self::Difficulty => "difficulty",
            Self::CookingTime => "cooking_time",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Ingredients => "Ingredients Analysis",
            Self::Difficulty => "Difficulty Analysis",
            Self::CookingTime => "Cooking Time Analysis",
        }
    }
}

impl FromStr for AnalysisType {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "ingredients" => Ok(Self::Ingredients),
            "difficulty" => Ok(Self::Difficulty),
            "cooking_time" => Ok(Self::CookingTime),
            other => Err(CatalogError::ParseError(format!(
                "Unknown analysis '{}': expected ingredients, difficulty or cooking_time",
                other
            ))),
        }
    }
}

impl fmt::Display for AnalysisType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartType {
    Bar,
    Pie,
    Line,
}

impl ChartType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bar => "bar",
            Self::Pie => "pie",
            Self::Line => "line",
        }
    }
}

impl FromStr for ChartType {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "bar" => Ok(Self::Bar),
            "pie" => Ok(Self::Pie),
            "line" => Ok(Self::Line),
            other => Err(CatalogError::ParseError(format!(
                "Unknown chart type '{}': expected bar, pie or line",
                other
            ))),
        }
    }
}

impl fmt::Display for ChartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub label: String,
    pub value: i64,
}

impl DataPoint {
    fn new(label: impl Into<String>, value: i64) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    pub title: String,
    pub analysis: AnalysisType,
    pub chart: ChartType,
    pub x_label: Option<String>,
    pub y_label: Option<String>,
    pub points: Vec<DataPoint>,
}

impl ChartData {
    fn new(analysis: AnalysisType, chart: ChartType, points: Vec<DataPoint>) -> Self {
        Self {
            title: analysis.title().to_string(),
            analysis,
            chart,
            x_label: None,
            y_label: None,
            points,
        }
    }

    fn axes(mut self, x: &str, y: &str) -> Self {
        self.x_label = Some(x.to_string());
        self.y_label = Some(y.to_string());
        self
    }

    pub fn total(&self) -> i64 {
        self.points.iter().map(|p| p.value).sum()
    }
}

/// Build the series for `analysis` drawn as `chart`; `None` when there is nothing to plot.
pub fn analyze(analysis: AnalysisType, chart: ChartType, recipes: &[Recipe]) -> Option<ChartData> {
    if recipes.is_empty() {
        return None;
    }

    let data = match analysis {
        AnalysisType::Ingredients => ChartData::new(analysis, chart, ingredient_counts(recipes)),
        AnalysisType::Difficulty => {
            let counts = difficulty_counts(recipes);
            match chart {
                ChartType::Pie => ChartData::new(
                    analysis,
                    chart,
                    counts
                        .into_iter()
                        .map(|(level, n)| DataPoint::new(format!("Level {}", level), n))
                        .collect(),
                ),
                ChartType::Bar | ChartType::Line => ChartData::new(
                    analysis,
                    chart,
                    counts.into_iter().map(|(level, n)| DataPoint::new(level, n)).collect(),
                )
                .axes("Difficulty Level", "Number of Recipes"),
            }
        }
        AnalysisType::CookingTime => {
            let times: Vec<i64> = recipes.iter().map(|r| i64::from(r.cooking_time)).collect();
            match chart {
                ChartType::Bar => ChartData::new(analysis, chart, cooking_time_histogram(&times))
                    .axes("Cooking Time (minutes)", "Number of Recipes"),
                ChartType::Pie => ChartData::new(analysis, chart, cooking_time_ranges(&times)),
                ChartType::Line => {
                    let mut sorted = times;
                    sorted.sort_unstable();
                    let points = sorted
                        .into_iter()
                        .enumerate()
                        .map(|(i, t)| DataPoint::new(i.to_string(), t))
                        .collect();
                    ChartData::new(analysis, chart, points).axes("Recipe Index", "Cooking Time (minutes)")
                }
            }
        }
    };

    Some(data)
}

/// Ten most common ingredients, most frequent first; ties keep first-seen order.
pub fn ingredient_counts(recipes: &[Recipe]) -> Vec<DataPoint> {
    let mut order: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, i64> = HashMap::new();

    for ingredient in recipes.iter().flat_map(|r| r.ingredient_list()) {
        let count = counts.entry(ingredient).or_insert(0);
        if *count == 0 {
            order.push(ingredient);
        }
        *count += 1;
    }

    // Stable sort: equal counts stay in first-seen order.
    order.sort_by(|a, b| counts[b].cmp(&counts[a]));
    order
        .into_iter()
        .take(TOP_INGREDIENTS)
        .map(|name| DataPoint::new(name, counts[name]))
        .collect()
}

/// Recipe count per difficulty value, ordered by value.
pub fn difficulty_counts(recipes: &[Recipe]) -> BTreeMap<String, i64> {
    let mut counts = BTreeMap::new();
    for recipe in recipes {
        *counts.entry(recipe.difficulty.trim().to_string()).or_insert(0) += 1;
    }
    counts
}

/// Equal-width histogram over `[min, max]`, last bin closed.
pub fn cooking_time_histogram(times: &[i64]) -> Vec<DataPoint> {
    let (Some(&min), Some(&max)) = (times.iter().min(), times.iter().max()) else {
        return Vec::new();
    };

    // A single distinct value gets a unit-wide window centred on it.
    let (lo, hi) = if min == max {
        (min as f64 - 0.5, max as f64 + 0.5)
    } else {
        (min as f64, max as f64)
    };
    let width = (hi - lo) / HISTOGRAM_BINS as f64;

    let mut bins = [0i64; HISTOGRAM_BINS];
    for &t in times {
        let idx = (((t as f64 - lo) / width).floor() as usize).min(HISTOGRAM_BINS - 1);
        bins[idx] += 1;
    }

    bins.iter()
        .enumerate()
        .map(|(i, &n)| {
            let start = lo + width * i as f64;
            DataPoint::new(format!("{:.1}-{:.1}", start, start + width), n)
        })
        .collect()
}

/// Five equal-width ranges over `[min, max]` under fixed labels; empty ranges are left out.
pub fn cooking_time_ranges(times: &[i64]) -> Vec<DataPoint> {
    let (Some(&min), Some(&max)) = (times.iter().min(), times.iter().max()) else {
        return Vec::new();
    };

    let bins = COOKING_TIME_RANGES.len();
    let mut counts = vec![0i64; bins];
    let width = (max - min) as f64 / bins as f64;

    for &t in times {
        let idx = if min == max {
            bins / 2
        } else {
            // Right-closed bins; the minimum belongs to the first.
            let raw = ((t - min) as f64 / width).ceil() as i64 - 1;
            raw.clamp(0, bins as i64 - 1) as usize
        };
        counts[idx] += 1;
    }

    COOKING_TIME_RANGES
        .iter()
        .zip(counts)
        .filter(|(_, n)| *n > 0)
        .map(|(label, n)| DataPoint::new(*label, n))
        .collect()
}
